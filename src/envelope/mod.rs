//! Envelope codec — the surface application code calls.
//!
//! `seal` draws a fresh nonce, encrypts with AES-256-GCM and packs
//! nonce ‖ tag ‖ ciphertext into one artifact; `open` reverses it.
//!
//! Callers outside the crypto core only ever see two failures here:
//! `UnableToEncryptData` and `UnableToDecryptData`. Whether an envelope
//! was malformed, tampered with, or opened with the wrong key is not
//! revealed. The detailed error is still available from
//! `Envelope::from_bytes` / `Envelope::open` for code that needs it.

pub mod format;

pub use format::{Envelope, HEADER_LEN};

use crate::crypto::cipher;
use crate::crypto::keys::SecretKey;
use crate::errors::{GcmSealError, Result};

/// Seal `plaintext` under `key`, returning the raw envelope bytes.
pub fn seal(plaintext: &[u8], key: &SecretKey) -> Result<Vec<u8>> {
    seal_envelope(plaintext, key)
        .map(|env| env.to_bytes())
        .map_err(encrypt_failed)
}

/// Open a raw envelope produced by `seal`.
pub fn open(envelope: &[u8], key: &SecretKey) -> Result<Vec<u8>> {
    Envelope::from_bytes(envelope)
        .and_then(|env| env.open(key.as_bytes()))
        .map_err(decrypt_failed)
}

/// Seal with a hex-encoded secret.
pub fn seal_with_hex_secret(plaintext: &[u8], hex_secret: &str) -> Result<Vec<u8>> {
    SecretKey::from_hex(hex_secret)
        .and_then(|key| seal_envelope(plaintext, &key))
        .map(|env| env.to_bytes())
        .map_err(encrypt_failed)
}

/// Open raw envelope bytes with a hex-encoded secret.
pub fn open_with_hex_secret(envelope: &[u8], hex_secret: &str) -> Result<Vec<u8>> {
    SecretKey::from_hex(hex_secret)
        .and_then(|key| Envelope::from_bytes(envelope).and_then(|env| env.open(key.as_bytes())))
        .map_err(decrypt_failed)
}

/// Seal a UTF-8 string with a hex-encoded secret; the envelope comes
/// back as unprefixed hex.
pub fn seal_str(text: &str, hex_secret: &str) -> Result<String> {
    SecretKey::from_hex(hex_secret)
        .and_then(|key| seal_envelope(text.as_bytes(), &key))
        .map(|env| env.to_hex())
        .map_err(encrypt_failed)
}

/// Open a hex envelope (optional `0x`) with a hex-encoded secret.
pub fn open_str(hex_envelope: &str, hex_secret: &str) -> Result<Vec<u8>> {
    SecretKey::from_hex(hex_secret)
        .and_then(|key| Envelope::from_hex(hex_envelope).and_then(|env| env.open(key.as_bytes())))
        .map_err(decrypt_failed)
}

/// Open a hex envelope (optional `0x`) with a key already in hand.
///
/// A bad hex digit is reported the same way as a bad tag.
pub fn open_hex(hex_envelope: &str, key: &SecretKey) -> Result<Vec<u8>> {
    Envelope::from_hex(hex_envelope.trim())
        .and_then(|env| env.open(key.as_bytes()))
        .map_err(decrypt_failed)
}

/// Derive the key with PBKDF2, then seal.
///
/// The salt and iteration count are not stored in the envelope; the
/// caller must keep them to open it again.
pub fn seal_with_passphrase(
    plaintext: &[u8],
    passphrase: &[u8],
    salt: &[u8],
    iterations: u32,
) -> Result<Vec<u8>> {
    let key = SecretKey::derive(passphrase, salt, iterations);
    seal(plaintext, &key)
}

/// Derive the key with PBKDF2, then open.
pub fn open_with_passphrase(
    envelope: &[u8],
    passphrase: &[u8],
    salt: &[u8],
    iterations: u32,
) -> Result<Vec<u8>> {
    let key = SecretKey::derive(passphrase, salt, iterations);
    open(envelope, &key)
}

fn seal_envelope(plaintext: &[u8], key: &SecretKey) -> Result<Envelope> {
    Envelope::seal_with_nonce(plaintext, key.as_bytes(), cipher::generate_nonce())
}

// Single place where detailed causes are dropped on the way out.
fn encrypt_failed(cause: GcmSealError) -> GcmSealError {
    tracing::debug!(%cause, "envelope seal failed");
    GcmSealError::UnableToEncryptData
}

fn decrypt_failed(cause: GcmSealError) -> GcmSealError {
    tracing::debug!(%cause, "envelope open failed");
    GcmSealError::UnableToDecryptData
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key() -> SecretKey {
        SecretKey::new([0x24u8; 32])
    }

    #[test]
    fn seal_open_roundtrip() {
        let sealed = seal(b"wallet seed", &key()).unwrap();
        assert_eq!(sealed.len(), HEADER_LEN + 11);
        assert_eq!(open(&sealed, &key()).unwrap(), b"wallet seed");
    }

    #[test]
    fn empty_plaintext_roundtrip() {
        let sealed = seal(b"", &key()).unwrap();
        assert_eq!(sealed.len(), HEADER_LEN);
        assert!(open(&sealed, &key()).unwrap().is_empty());
    }

    #[test]
    fn short_envelope_collapses_to_decrypt_error() {
        assert!(matches!(
            open(&[0u8; 10], &key()),
            Err(GcmSealError::UnableToDecryptData)
        ));
    }

    #[test]
    fn bad_hex_secret_collapses_to_boundary_errors() {
        assert!(matches!(
            seal_with_hex_secret(b"x", "zz"),
            Err(GcmSealError::UnableToEncryptData)
        ));
        assert!(matches!(
            seal_str("x", "abcd"),
            Err(GcmSealError::UnableToEncryptData)
        ));
        let sealed = seal(b"x", &key()).unwrap();
        assert!(matches!(
            open_with_hex_secret(&sealed, "nothex"),
            Err(GcmSealError::UnableToDecryptData)
        ));
    }

    #[test]
    fn hex_secret_variants_interoperate_with_key_variant() {
        let hex_secret = key().to_hex();
        let sealed = seal_with_hex_secret(b"interop", &hex_secret).unwrap();
        assert_eq!(open(&sealed, &key()).unwrap(), b"interop");
        assert_eq!(
            open_with_hex_secret(&sealed, &format!("0x{hex_secret}")).unwrap(),
            b"interop"
        );
    }

    #[test]
    fn str_variants_roundtrip() {
        let hex_secret = key().to_hex();
        let sealed = seal_str("hello world", &hex_secret).unwrap();
        assert!(!sealed.starts_with("0x"));
        assert!(sealed.chars().all(|c| c.is_ascii_hexdigit() && !c.is_ascii_uppercase()));
        assert_eq!(open_str(&sealed, &hex_secret).unwrap(), b"hello world");
        assert_eq!(
            open_str(&format!("0x{sealed}"), &hex_secret).unwrap(),
            b"hello world"
        );
    }

    #[test]
    fn open_str_rejects_garbage_envelope() {
        let hex_secret = key().to_hex();
        assert!(matches!(
            open_str("0xnothex", &hex_secret),
            Err(GcmSealError::UnableToDecryptData)
        ));
    }

    #[test]
    fn open_hex_hides_hex_and_length_causes() {
        let sealed = seal(b"text", &key()).unwrap();
        let text = crate::encoding::hex::encode(&sealed);
        assert_eq!(open_hex(&format!(" 0x{text}\n"), &key()).unwrap(), b"text");

        for bad in ["0xzz", "abc", ""] {
            assert!(
                matches!(open_hex(bad, &key()), Err(GcmSealError::UnableToDecryptData)),
                "{bad:?}"
            );
        }
    }

    #[test]
    fn passphrase_variants_roundtrip() {
        let sealed = seal_with_passphrase(b"data", b"pass", b"salt", 5).unwrap();
        assert_eq!(
            open_with_passphrase(&sealed, b"pass", b"salt", 5).unwrap(),
            b"data"
        );
        assert!(matches!(
            open_with_passphrase(&sealed, b"pass", b"salt", 6),
            Err(GcmSealError::UnableToDecryptData)
        ));
    }
}
