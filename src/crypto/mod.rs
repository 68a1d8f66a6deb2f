//! Cryptographic primitives for gcmseal.
//!
//! This module provides:
//! - AES-256-GCM encryption and decryption with a detached tag (`cipher`)
//! - PBKDF2-HMAC-SHA256 password-based key derivation (`kdf`)
//! - The zeroize-on-drop `SecretKey` wrapper (`keys`)
//! - SHA-256 hex digests (`digest`)

pub mod cipher;
pub mod digest;
pub mod kdf;
pub mod keys;

// Re-export the most commonly used items so callers can write:
//   use crate::crypto::{encrypt, decrypt, derive_key, ...};
pub use cipher::{
    decrypt, decrypt_with_aad, decrypt_with_passphrase, encrypt, encrypt_with_aad,
    encrypt_with_passphrase, generate_nonce, NONCE_LEN, TAG_LEN,
};
pub use digest::sha256_hex;
pub use kdf::{derive_key, derive_key_default, generate_salt, DEFAULT_ITERATIONS};
pub use keys::{SecretKey, KEY_LEN};
