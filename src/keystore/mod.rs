//! Secure key store abstraction.
//!
//! Long-lived keys are generated inside a key store and referred to by
//! alias; application code never sees their bytes. The store is reached
//! only through `KeyStoreManager`, which serializes every operation under
//! one reentrant `StoreLock`.
//!
//! Backends implement `SecureKeyStore`:
//! - `MemoryKeyStore`: in-process, for tests and ephemeral use
//! - `FileKeyStore`: JSON document in an owner-only directory
//! - `KeyringKeyStore`: OS keyring (feature `keyring-store`)

pub mod file;
pub mod key_spec;
pub mod lock;
pub mod manager;
mod material;
pub mod memory;

#[cfg(feature = "keyring-store")]
pub mod keyring;

pub use file::FileKeyStore;
pub use key_spec::{validate_alias, KeyHandle, KeySpec};
pub use lock::StoreLock;
pub use manager::KeyStoreManager;
pub use memory::MemoryKeyStore;

#[cfg(feature = "keyring-store")]
pub use self::keyring::KeyringKeyStore;

use chrono::{DateTime, Utc};

use crate::envelope::Envelope;
use crate::errors::Result;

/// Platform key store capability.
///
/// Implementations need not be safe under concurrent use from several
/// threads at once: `KeyStoreManager` never calls them concurrently.
/// They must still be `Send + Sync` so a manager can be shared.
///
/// # Errors
///
/// `KeyStoreUnavailable` when the backing store cannot be opened or read,
/// `KeyGenerationFailed` when a key for the spec cannot be created, and
/// `KeyNotFound` when a handle no longer refers to a stored key.
pub trait SecureKeyStore: Send + Sync {
    /// Open or refresh the backing store.
    fn load(&self) -> Result<()>;

    /// Handle of the key under `alias`, if one exists.
    fn get(&self, alias: &str) -> Result<Option<KeyHandle>>;

    /// Generate and persist a new key for `spec`, replacing any existing
    /// key under the same alias.
    fn generate(&self, spec: &KeySpec) -> Result<KeyHandle>;

    fn contains(&self, alias: &str) -> Result<bool>;

    /// Remove the key under `alias`; removing a missing alias succeeds.
    fn delete(&self, alias: &str) -> Result<()>;

    /// All aliases in the store.
    fn aliases(&self) -> Result<Vec<String>>;

    /// When the key under `alias` was generated, if the backend records it.
    fn created_at(&self, alias: &str) -> Result<Option<DateTime<Utc>>> {
        let _ = alias;
        Ok(None)
    }

    /// Encrypt with the referenced key under a nonce chosen by the store.
    fn encrypt(&self, handle: &KeyHandle, plaintext: &[u8]) -> Result<Envelope>;

    /// Verify and decrypt with the referenced key.
    fn decrypt(&self, handle: &KeyHandle, envelope: &Envelope) -> Result<Vec<u8>>;
}
