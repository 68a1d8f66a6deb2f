//! `gcmseal derive` — derive a key from a passphrase.
//!
//! Prints `salt=<hex>` and `key=<hex>` lines. Keep the salt: the same
//! passphrase, salt and iteration count always give the same key.

use crate::cli::{display_hex, load_settings, prompt_passphrase, resolve_iterations};
use crate::crypto::kdf;
use crate::crypto::keys::SecretKey;
use crate::encoding::hex;
use crate::errors::{GcmSealError, Result};

/// Execute the `derive` command.
pub fn execute(salt: Option<&str>, iterations: Option<u32>) -> Result<()> {
    let settings = load_settings()?;
    let iterations = resolve_iterations(iterations, &settings)?;

    let salt = match salt {
        Some(s) => hex::decode(s)
            .map_err(|e| GcmSealError::CommandFailed(format!("invalid --salt: {e}")))?,
        None => kdf::generate_salt().to_vec(),
    };

    let passphrase = prompt_passphrase()?;
    let key = SecretKey::derive(passphrase.as_bytes(), &salt, iterations);
    tracing::debug!(iterations, salt_len = salt.len(), "derived key");

    println!("salt={}", display_hex(&salt, &settings));
    println!("key={}", display_hex(key.as_bytes(), &settings));

    Ok(())
}
