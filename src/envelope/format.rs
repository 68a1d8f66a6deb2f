//! Binary envelope layout.
//!
//! An envelope bundles everything needed to decrypt except the key:
//!
//! ```text
//! [nonce: 12 bytes][GCM tag: 16 bytes][ciphertext: N bytes]
//! ```
//!
//! - **Nonce**: random per encryption, never reused with the same key.
//! - **Tag**: 128-bit GCM authentication tag over the ciphertext.
//! - **Ciphertext**: same length as the plaintext (GCM does not pad).
//!
//! The text form is the same bytes hex-encoded with no separators.
//! It is written without a `0x` prefix; one is accepted on input.

use std::fmt;

use crate::crypto::cipher::{self, NONCE_LEN, TAG_LEN};
use crate::encoding::hex;
use crate::errors::{GcmSealError, Result};

/// Bytes in front of the ciphertext: nonce + tag.
pub const HEADER_LEN: usize = NONCE_LEN + TAG_LEN;

/// A parsed nonce ‖ tag ‖ ciphertext triple.
#[derive(Clone, PartialEq, Eq)]
pub struct Envelope {
    pub nonce: [u8; NONCE_LEN],
    pub tag: [u8; TAG_LEN],
    pub ciphertext: Vec<u8>,
}

impl Envelope {
    /// Encrypt `plaintext` under `key` with an explicit `nonce`.
    ///
    /// Only use a fixed nonce for test vectors; real callers go through
    /// `envelope::seal`, which draws a fresh one every time.
    pub fn seal_with_nonce(plaintext: &[u8], key: &[u8], nonce: [u8; NONCE_LEN]) -> Result<Self> {
        let (ciphertext, tag) = cipher::encrypt(plaintext, key, &nonce)?;
        Ok(Self {
            nonce,
            tag,
            ciphertext,
        })
    }

    /// Verify and decrypt this envelope under `key`.
    pub fn open(&self, key: &[u8]) -> Result<Vec<u8>> {
        cipher::decrypt(&self.ciphertext, key, &self.nonce, &self.tag)
    }

    /// Split raw envelope bytes into their three parts.
    ///
    /// Anything shorter than nonce + tag is rejected with
    /// `MalformedEnvelope` before any cipher work happens. Exactly
    /// `HEADER_LEN` bytes is the envelope of an empty plaintext.
    pub fn from_bytes(data: &[u8]) -> Result<Self> {
        if data.len() < HEADER_LEN {
            return Err(GcmSealError::MalformedEnvelope(data.len()));
        }

        let (nonce, rest) = data.split_at(NONCE_LEN);
        let (tag, ciphertext) = rest.split_at(TAG_LEN);

        Ok(Self {
            nonce: nonce
                .try_into()
                .map_err(|_| GcmSealError::MalformedEnvelope(data.len()))?,
            tag: tag
                .try_into()
                .map_err(|_| GcmSealError::MalformedEnvelope(data.len()))?,
            ciphertext: ciphertext.to_vec(),
        })
    }

    /// Parse the hex text form (optional `0x` prefix).
    pub fn from_hex(text: &str) -> Result<Self> {
        Self::from_bytes(&hex::decode(text)?)
    }

    /// Serialize to nonce ‖ tag ‖ ciphertext.
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut buf = Vec::with_capacity(self.len());
        buf.extend_from_slice(&self.nonce); // 12 bytes
        buf.extend_from_slice(&self.tag); // 16 bytes
        buf.extend_from_slice(&self.ciphertext); // N bytes
        buf
    }

    /// Serialize to unprefixed lower-case hex.
    pub fn to_hex(&self) -> String {
        hex::encode(&self.to_bytes())
    }

    /// Total serialized length in bytes.
    pub fn len(&self) -> usize {
        HEADER_LEN + self.ciphertext.len()
    }

    /// Whether the envelope carries no ciphertext (empty plaintext).
    pub fn is_empty(&self) -> bool {
        self.ciphertext.is_empty()
    }
}

impl fmt::Debug for Envelope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Envelope")
            .field("nonce", &hex::encode(&self.nonce))
            .field("tag", &hex::encode(&self.tag))
            .field("ciphertext_len", &self.ciphertext.len())
            .finish()
    }
}
