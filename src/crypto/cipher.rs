//! AES-256-GCM authenticated encryption with a detached tag.
//!
//! The engine works on the three parts separately — nonce, ciphertext,
//! tag — and leaves framing to the envelope codec. Every call takes the
//! nonce from the caller; use `generate_nonce` for a fresh one and never
//! reuse a nonce with the same key.
//!
//! Length problems (key, nonce, tag) are reported as `InvalidLength`
//! and are kept apart from `AuthenticationFailed`, which only ever means
//! the tag did not verify.

use aes_gcm::aead::{AeadCore, AeadInPlace, KeyInit, OsRng};
use aes_gcm::{Aes256Gcm, Nonce, Tag};
use zeroize::Zeroize;

use super::kdf;
use crate::errors::{GcmSealError, Result};

/// Size of the AES-256 key in bytes.
pub const KEY_LEN: usize = 32;

/// Size of the AES-256-GCM nonce in bytes.
pub const NONCE_LEN: usize = 12;

/// Size of the GCM authentication tag in bytes (128 bits).
pub const TAG_LEN: usize = 16;

/// Generate a random 12-byte nonce from the OS CSPRNG.
pub fn generate_nonce() -> [u8; NONCE_LEN] {
    Aes256Gcm::generate_nonce(&mut OsRng).into()
}

/// Encrypt `plaintext` under `key` and `nonce`.
///
/// Returns `(ciphertext, tag)`; the ciphertext is exactly as long as the
/// plaintext.
pub fn encrypt(plaintext: &[u8], key: &[u8], nonce: &[u8]) -> Result<(Vec<u8>, [u8; TAG_LEN])> {
    encrypt_with_aad(plaintext, key, nonce, &[])
}

/// Encrypt `plaintext`, binding `aad` into the tag without encrypting it.
pub fn encrypt_with_aad(
    plaintext: &[u8],
    key: &[u8],
    nonce: &[u8],
    aad: &[u8],
) -> Result<(Vec<u8>, [u8; TAG_LEN])> {
    let cipher = build_cipher(key)?;
    check_len("nonce", nonce, NONCE_LEN)?;

    let mut buffer = plaintext.to_vec();
    let tag = cipher
        .encrypt_in_place_detached(Nonce::from_slice(nonce), aad, &mut buffer)
        .map_err(|_| {
            buffer.zeroize();
            GcmSealError::UnableToGenerateAuthenticationTag
        })?;

    Ok((buffer, tag.into()))
}

/// Decrypt `ciphertext` after verifying `tag`.
///
/// Nothing is released unless the tag checks out.
pub fn decrypt(ciphertext: &[u8], key: &[u8], nonce: &[u8], tag: &[u8]) -> Result<Vec<u8>> {
    decrypt_with_aad(ciphertext, key, nonce, tag, &[])
}

/// Decrypt `ciphertext`, verifying `tag` over ciphertext and `aad`.
pub fn decrypt_with_aad(
    ciphertext: &[u8],
    key: &[u8],
    nonce: &[u8],
    tag: &[u8],
    aad: &[u8],
) -> Result<Vec<u8>> {
    let cipher = build_cipher(key)?;
    check_len("nonce", nonce, NONCE_LEN)?;
    check_len("authentication tag", tag, TAG_LEN)?;

    let mut buffer = ciphertext.to_vec();
    match cipher.decrypt_in_place_detached(
        Nonce::from_slice(nonce),
        aad,
        &mut buffer,
        Tag::from_slice(tag),
    ) {
        Ok(()) => Ok(buffer),
        Err(_) => {
            buffer.zeroize();
            Err(GcmSealError::AuthenticationFailed)
        }
    }
}

/// Derive a key with PBKDF2, then encrypt.
///
/// Use this when only a passphrase is available; `salt` and
/// `iterations` must be stored alongside the output to decrypt later.
pub fn encrypt_with_passphrase(
    plaintext: &[u8],
    passphrase: &[u8],
    salt: &[u8],
    iterations: u32,
    nonce: &[u8],
) -> Result<(Vec<u8>, [u8; TAG_LEN])> {
    let mut key = kdf::derive_key(passphrase, salt, iterations);
    let result = encrypt(plaintext, &key, nonce);
    key.zeroize();
    result
}

/// Derive a key with PBKDF2, then decrypt.
pub fn decrypt_with_passphrase(
    ciphertext: &[u8],
    passphrase: &[u8],
    salt: &[u8],
    iterations: u32,
    nonce: &[u8],
    tag: &[u8],
) -> Result<Vec<u8>> {
    let mut key = kdf::derive_key(passphrase, salt, iterations);
    let result = decrypt(ciphertext, &key, nonce, tag);
    key.zeroize();
    result
}

fn build_cipher(key: &[u8]) -> Result<Aes256Gcm> {
    check_len("key", key, KEY_LEN)?;
    Aes256Gcm::new_from_slice(key).map_err(|_| GcmSealError::InvalidLength {
        what: "key",
        expected: KEY_LEN,
        actual: key.len(),
    })
}

fn check_len(what: &'static str, bytes: &[u8], expected: usize) -> Result<()> {
    if bytes.len() == expected {
        Ok(())
    } else {
        Err(GcmSealError::InvalidLength {
            what,
            expected,
            actual: bytes.len(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::encoding::hex;

    const ZERO_KEY: [u8; KEY_LEN] = [0u8; KEY_LEN];
    const ZERO_NONCE: [u8; NONCE_LEN] = [0u8; NONCE_LEN];

    #[test]
    fn golden_vector_hello_world() {
        let (ciphertext, tag) = encrypt(b"hello world", &ZERO_KEY, &ZERO_NONCE).unwrap();
        assert_eq!(hex::encode(&ciphertext), "a6c22c5122401c017522a1");
        assert_eq!(hex::encode(&tag), "abb09809c04b9316629264b4ab744e2c");
    }

    // NIST GCM test case 13: zero key, zero IV, empty plaintext.
    #[test]
    fn golden_vector_empty_plaintext() {
        let (ciphertext, tag) = encrypt(b"", &ZERO_KEY, &ZERO_NONCE).unwrap();
        assert!(ciphertext.is_empty());
        assert_eq!(hex::encode(&tag), "530f8afbc74536b9a963b4f1c4cb738b");
    }

    #[test]
    fn ciphertext_length_equals_plaintext_length() {
        for len in [0usize, 1, 15, 16, 17, 1000] {
            let plaintext = vec![0x5Au8; len];
            let (ciphertext, tag) = encrypt(&plaintext, &[7u8; KEY_LEN], &generate_nonce()).unwrap();
            assert_eq!(ciphertext.len(), len);
            assert_eq!(tag.len(), TAG_LEN);
        }
    }

    #[test]
    fn decrypt_roundtrip() {
        let key = [0x42u8; KEY_LEN];
        let nonce = generate_nonce();
        let (ciphertext, tag) = encrypt(b"seed words", &key, &nonce).unwrap();
        let plaintext = decrypt(&ciphertext, &key, &nonce, &tag).unwrap();
        assert_eq!(plaintext, b"seed words");
    }

    #[test]
    fn tampered_tag_fails_authentication() {
        let key = [0x42u8; KEY_LEN];
        let nonce = generate_nonce();
        let (ciphertext, mut tag) = encrypt(b"seed words", &key, &nonce).unwrap();
        tag[0] ^= 0x01;
        assert!(matches!(
            decrypt(&ciphertext, &key, &nonce, &tag),
            Err(GcmSealError::AuthenticationFailed)
        ));
    }

    #[test]
    fn wrong_nonce_fails_authentication() {
        let key = [0x42u8; KEY_LEN];
        let (ciphertext, tag) = encrypt(b"seed words", &key, &ZERO_NONCE).unwrap();
        let other_nonce = [1u8; NONCE_LEN];
        assert!(matches!(
            decrypt(&ciphertext, &key, &other_nonce, &tag),
            Err(GcmSealError::AuthenticationFailed)
        ));
    }

    #[test]
    fn associated_data_is_authenticated() {
        let key = [0x11u8; KEY_LEN];
        let nonce = generate_nonce();
        let (ciphertext, tag) = encrypt_with_aad(b"payload", &key, &nonce, b"ctx-a").unwrap();

        let ok = decrypt_with_aad(&ciphertext, &key, &nonce, &tag, b"ctx-a").unwrap();
        assert_eq!(ok, b"payload");

        assert!(matches!(
            decrypt_with_aad(&ciphertext, &key, &nonce, &tag, b"ctx-b"),
            Err(GcmSealError::AuthenticationFailed)
        ));
    }

    #[test]
    fn bad_lengths_are_format_errors() {
        let key = [0u8; KEY_LEN];

        let err = encrypt(b"x", &[0u8; 16], &ZERO_NONCE).unwrap_err();
        assert!(matches!(err, GcmSealError::InvalidLength { what: "key", .. }));

        let err = encrypt(b"x", &key, &[0u8; 8]).unwrap_err();
        assert!(matches!(err, GcmSealError::InvalidLength { what: "nonce", .. }));

        let err = decrypt(b"x", &key, &ZERO_NONCE, &[0u8; 12]).unwrap_err();
        assert!(matches!(
            err,
            GcmSealError::InvalidLength {
                what: "authentication tag",
                expected: 16,
                actual: 12
            }
        ));
    }

    #[test]
    fn passphrase_variants_roundtrip() {
        let nonce = generate_nonce();
        let (ciphertext, tag) =
            encrypt_with_passphrase(b"secret", b"correct horse", b"salt", 10, &nonce).unwrap();
        let plaintext =
            decrypt_with_passphrase(&ciphertext, b"correct horse", b"salt", 10, &nonce, &tag)
                .unwrap();
        assert_eq!(plaintext, b"secret");

        assert!(matches!(
            decrypt_with_passphrase(&ciphertext, b"wrong horse", b"salt", 10, &nonce, &tag),
            Err(GcmSealError::AuthenticationFailed)
        ));
    }

    #[test]
    fn generate_nonce_is_random() {
        assert_ne!(generate_nonce(), generate_nonce());
    }
}
