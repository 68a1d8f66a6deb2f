//! Caller-owned symmetric key material.
//!
//! `SecretKey` holds the 32 raw bytes of an AES-256 key that was either
//! supplied directly (raw or hex) or derived with PBKDF2. The bytes are
//! zeroed on drop and never appear in `Debug` output.
//!
//! Keys that live in a secure key store never pass through this type;
//! see `crate::keystore`.

use std::fmt;

use rand::RngCore;
use zeroize::{Zeroize, ZeroizeOnDrop};

use super::kdf;
use crate::encoding::hex;
use crate::errors::{GcmSealError, Result};

/// Length of an AES-256 key (256 bits).
pub const KEY_LEN: usize = 32;

/// A 32-byte AES-256 key that zeroes its memory when dropped.
///
/// Not `Clone`: pass `&SecretKey` so the bytes live in exactly one place.
#[derive(Zeroize, ZeroizeOnDrop)]
pub struct SecretKey {
    bytes: [u8; KEY_LEN],
}

impl SecretKey {
    /// Wrap an existing 32-byte array.
    pub fn new(bytes: [u8; KEY_LEN]) -> Self {
        Self { bytes }
    }

    /// Copy key bytes out of a slice, which must be exactly 32 bytes.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        let bytes = <[u8; KEY_LEN]>::try_from(bytes).map_err(|_| GcmSealError::InvalidLength {
            what: "key",
            expected: KEY_LEN,
            actual: bytes.len(),
        })?;
        Ok(Self { bytes })
    }

    /// Parse a hex-encoded key (optional `0x` prefix).
    pub fn from_hex(text: &str) -> Result<Self> {
        let mut decoded = hex::decode(text)?;
        let key = Self::from_bytes(&decoded);
        decoded.zeroize();
        key
    }

    /// Derive a key from a passphrase with PBKDF2-HMAC-SHA256.
    ///
    /// # Panics
    ///
    /// Panics if derivation fails; see `crypto::kdf::derive_key`.
    pub fn derive(password: &[u8], salt: &[u8], iterations: u32) -> Self {
        Self::new(kdf::derive_key(password, salt, iterations))
    }

    /// Generate a fresh random key.
    pub fn generate() -> Self {
        let mut bytes = [0u8; KEY_LEN];
        rand::rng().fill_bytes(&mut bytes);
        Self { bytes }
    }

    /// Access the raw key bytes.
    pub fn as_bytes(&self) -> &[u8; KEY_LEN] {
        &self.bytes
    }

    /// Hex-encode the key (for handing to text-oriented callers).
    pub fn to_hex(&self) -> String {
        hex::encode(&self.bytes)
    }
}

impl fmt::Debug for SecretKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("SecretKey(<redacted>)")
    }
}
