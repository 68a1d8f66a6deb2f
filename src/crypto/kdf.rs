//! Password-based key derivation using PBKDF2-HMAC-SHA256.
//!
//! Stretches a low-entropy passphrase into a 32-byte AES-256 key. The
//! iteration count is the cost knob: the default of 50 000 is the
//! compatibility value for every artifact sealed so far, and lowering it
//! weakens the derivation.
//!
//! Derivation failure is **not** a recoverable error. If the backend
//! rejects the parameters we panic rather than hand back an empty or
//! partial key.

use hmac::Hmac;
use rand::RngCore;
use sha2::Sha256;

/// Length of the derived key in bytes (256 bits, for AES-256).
pub const KEY_LEN: usize = 32;

/// Length of salts produced by `generate_salt` (256 bits).
pub const SALT_LEN: usize = 32;

/// Default PBKDF2 iteration count.
pub const DEFAULT_ITERATIONS: u32 = 50_000;

/// Derive a 32-byte key with the default iteration count.
pub fn derive_key_default(password: &[u8], salt: &[u8]) -> [u8; KEY_LEN] {
    derive_key(password, salt, DEFAULT_ITERATIONS)
}

/// Derive a 32-byte key from `password` and `salt`.
///
/// The same password + salt + iterations always produce the same key.
///
/// # Panics
///
/// Panics if the iteration count is zero or the PBKDF2 backend rejects
/// the parameters. Continuing without key material is not an option.
pub fn derive_key(password: &[u8], salt: &[u8], iterations: u32) -> [u8; KEY_LEN] {
    if iterations == 0 {
        panic!("SECURITY FAILURE: could not derive secure key (iteration count must be non-zero)");
    }

    let mut key = [0u8; KEY_LEN];
    if let Err(e) = pbkdf2::pbkdf2::<Hmac<Sha256>>(password, salt, iterations, &mut key) {
        panic!("SECURITY FAILURE: could not derive secure key ({e})");
    }

    key
}

/// Generate a cryptographically random 32-byte salt.
pub fn generate_salt() -> [u8; SALT_LEN] {
    let mut salt = [0u8; SALT_LEN];
    rand::rng().fill_bytes(&mut salt);
    salt
}

#[cfg(test)]
mod tests {
    use super::*;

    // Published PBKDF2-HMAC-SHA256 vectors, 32-byte output.
    #[test]
    fn known_answer_one_iteration() {
        let key = derive_key(b"password", b"salt", 1);
        assert_eq!(
            crate::encoding::hex::encode(&key),
            "120fb6cffcf8b32c43e7225256c4f837a86548c92ccc35480805987cb70be17b"
        );
    }

    #[test]
    fn known_answer_4096_iterations() {
        let key = derive_key(b"password", b"salt", 4096);
        assert_eq!(
            crate::encoding::hex::encode(&key),
            "c5e478d59288c841aa530db6845c4c8d962893a001ce4e11a4963873aa98134a"
        );
    }

    #[test]
    fn default_uses_50k_iterations() {
        assert_eq!(DEFAULT_ITERATIONS, 50_000);
        let a = derive_key_default(b"pw", b"salt");
        let b = derive_key(b"pw", b"salt", 50_000);
        assert_eq!(a, b);
    }

    #[test]
    fn empty_password_and_salt_still_derive() {
        let key = derive_key(b"", b"", 2);
        assert_ne!(key, [0u8; KEY_LEN]);
    }

    #[test]
    #[should_panic(expected = "SECURITY FAILURE")]
    fn zero_iterations_is_fatal() {
        let _ = derive_key(b"password", b"salt", 0);
    }

    #[test]
    fn generate_salt_is_random() {
        assert_ne!(generate_salt(), generate_salt());
    }
}
