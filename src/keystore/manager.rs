//! Serialized access to a `SecureKeyStore`.
//!
//! `KeyStoreManager` is the only way application code should touch a key
//! store. Every operation holds the store lock from the backend's `load`
//! to the final result, so a create can never interleave with a delete,
//! whatever the aliases.

use std::sync::Arc;

use chrono::{DateTime, Utc};

use super::key_spec::{KeyHandle, KeySpec};
use super::lock::StoreLock;
use super::SecureKeyStore;
use crate::envelope::Envelope;
use crate::errors::{GcmSealError, Result};

/// Lifecycle manager for keys held by a `SecureKeyStore` backend.
pub struct KeyStoreManager<S> {
    store: S,
    lock: Arc<StoreLock>,
}

impl<S: SecureKeyStore> KeyStoreManager<S> {
    /// Manage `store` under the process-wide lock.
    pub fn new(store: S) -> Self {
        Self::with_lock(store, StoreLock::global())
    }

    /// Manage `store` under an explicitly supplied lock.
    pub fn with_lock(store: S, lock: Arc<StoreLock>) -> Self {
        Self { store, lock }
    }

    /// The wrapped backend.
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Return the key under `spec.alias()`, generating it first if absent.
    ///
    /// Idempotent: a second call returns the same handle.
    pub fn get_or_create(&self, spec: &KeySpec) -> Result<KeyHandle> {
        self.locked(|store| {
            if let Some(handle) = store.get(spec.alias())? {
                tracing::debug!(alias = spec.alias(), "using existing key");
                return Ok(handle);
            }

            let handle = store.generate(spec)?;
            tracing::info!(
                alias = spec.alias(),
                user_auth = spec.user_authentication_required(),
                "generated new key"
            );
            Ok(handle)
        })
    }

    /// Whether a key exists under `alias`. Never modifies the store.
    pub fn contains(&self, alias: &str) -> Result<bool> {
        self.locked(|store| store.contains(alias))
    }

    /// Remove the key under `alias`; a missing alias is not an error.
    pub fn delete(&self, alias: &str) -> Result<()> {
        self.locked(|store| {
            if store.contains(alias)? {
                store.delete(alias)?;
                tracing::info!(alias, "deleted key");
            } else {
                tracing::debug!(alias, "delete on absent key");
            }
            Ok(())
        })
    }

    /// Seal `plaintext` with the stored key under `alias`.
    ///
    /// The backend picks the nonce. The result uses the same
    /// nonce ‖ tag ‖ ciphertext layout as `envelope::seal`.
    pub fn seal(&self, alias: &str, plaintext: &[u8]) -> Result<Vec<u8>> {
        self.locked(|store| {
            let handle = existing(store, alias)?;
            let envelope = store
                .encrypt(&handle, plaintext)
                .map_err(|e| collapse(e, GcmSealError::UnableToEncryptData))?;
            Ok(envelope.to_bytes())
        })
    }

    /// Open an envelope sealed by `seal` under the same alias.
    ///
    /// Store failures come back unchanged; a malformed, tampered or
    /// wrong-key envelope is reported only as `UnableToDecryptData`.
    pub fn open(&self, alias: &str, envelope: &[u8]) -> Result<Vec<u8>> {
        self.locked(|store| {
            let handle = existing(store, alias)?;
            Envelope::from_bytes(envelope)
                .and_then(|env| store.decrypt(&handle, &env))
                .map_err(|e| collapse(e, GcmSealError::UnableToDecryptData))
        })
    }

    /// `open` for the hex text form (optional `0x`). Bad hex is reported
    /// as `UnableToDecryptData`, like any other unreadable envelope.
    pub fn open_hex(&self, alias: &str, hex_envelope: &str) -> Result<Vec<u8>> {
        self.locked(|store| {
            let handle = existing(store, alias)?;
            Envelope::from_hex(hex_envelope.trim())
                .and_then(|env| store.decrypt(&handle, &env))
                .map_err(|e| collapse(e, GcmSealError::UnableToDecryptData))
        })
    }

    /// Every alias currently present, sorted.
    pub fn list(&self) -> Result<Vec<String>> {
        self.locked(|store| {
            let mut aliases = store.aliases()?;
            aliases.sort();
            Ok(aliases)
        })
    }

    /// Every alias with its creation time (when the backend records it),
    /// sorted by alias, read under one lock acquisition.
    pub fn inventory(&self) -> Result<Vec<(String, Option<DateTime<Utc>>)>> {
        self.locked(|store| {
            let mut aliases = store.aliases()?;
            aliases.sort();
            aliases
                .into_iter()
                .map(|alias| {
                    let created = store.created_at(&alias)?;
                    Ok((alias, created))
                })
                .collect()
        })
    }

    /// Run `f` while holding the store lock.
    ///
    /// The lock is reentrant, so `f` may call other manager operations.
    pub fn exclusive<R>(&self, f: impl FnOnce(&Self) -> Result<R>) -> Result<R> {
        let _guard = self.lock.acquire();
        f(self)
    }

    fn locked<R>(&self, f: impl FnOnce(&S) -> Result<R>) -> Result<R> {
        let _guard = self.lock.acquire();
        self.store.load()?;
        f(&self.store)
    }
}

fn existing<S: SecureKeyStore>(store: &S, alias: &str) -> Result<KeyHandle> {
    store
        .get(alias)?
        .ok_or_else(|| GcmSealError::KeyNotFound(alias.to_string()))
}

/// Keep key store errors as they are; hide cipher and format causes.
fn collapse(cause: GcmSealError, opaque: GcmSealError) -> GcmSealError {
    match cause {
        GcmSealError::KeyStoreUnavailable(_)
        | GcmSealError::KeyGenerationFailed(_)
        | GcmSealError::KeyNotFound(_) => cause,
        other => {
            tracing::debug!(cause = %other, "stored-key operation failed");
            opaque
        }
    }
}
