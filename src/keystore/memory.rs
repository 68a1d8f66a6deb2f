//! In-memory key store.
//!
//! Software emulation of a secure enclave for tests and short-lived
//! processes. Keys vanish when the store is dropped. User-authentication
//! flags are recorded but nothing prompts the user.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use chrono::{DateTime, Utc};

use super::key_spec::{validate_alias, KeyHandle, KeySpec};
use super::material::StoredKey;
use super::SecureKeyStore;
use crate::envelope::Envelope;
use crate::errors::{GcmSealError, Result};

/// Thread-safe in-memory `SecureKeyStore`.
pub struct MemoryKeyStore {
    keys: RwLock<HashMap<String, StoredKey>>,
    available: AtomicBool,
}

impl MemoryKeyStore {
    pub fn new() -> Self {
        Self {
            keys: RwLock::new(HashMap::new()),
            available: AtomicBool::new(true),
        }
    }

    /// Simulate the platform store going away (or coming back).
    ///
    /// While unavailable, every operation fails with
    /// `KeyStoreUnavailable`.
    pub fn set_available(&self, available: bool) {
        self.available.store(available, Ordering::SeqCst);
    }

    /// Number of stored keys. Fails like every other operation while
    /// the store is unavailable.
    pub fn len(&self) -> Result<usize> {
        Ok(self.read()?.len())
    }

    pub fn is_empty(&self) -> Result<bool> {
        Ok(self.read()?.is_empty())
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, HashMap<String, StoredKey>>> {
        self.ensure_available()?;
        self.keys
            .read()
            .map_err(|_| GcmSealError::KeyStoreUnavailable("memory store lock poisoned".into()))
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, HashMap<String, StoredKey>>> {
        self.ensure_available()?;
        self.keys
            .write()
            .map_err(|_| GcmSealError::KeyStoreUnavailable("memory store lock poisoned".into()))
    }

    fn ensure_available(&self) -> Result<()> {
        if self.available.load(Ordering::SeqCst) {
            Ok(())
        } else {
            Err(GcmSealError::KeyStoreUnavailable(
                "memory store is offline".into(),
            ))
        }
    }

    fn with_key<R>(&self, handle: &KeyHandle, f: impl FnOnce(&StoredKey) -> Result<R>) -> Result<R> {
        let keys = self.read()?;
        let stored = keys
            .get(handle.alias())
            .ok_or_else(|| GcmSealError::KeyNotFound(handle.alias().to_string()))?;
        stored.check_handle(handle)?;
        f(stored)
    }
}

impl Default for MemoryKeyStore {
    fn default() -> Self {
        Self::new()
    }
}

impl SecureKeyStore for MemoryKeyStore {
    fn load(&self) -> Result<()> {
        self.ensure_available()
    }

    fn get(&self, alias: &str) -> Result<Option<KeyHandle>> {
        Ok(self.read()?.get(alias).map(|stored| stored.handle(alias)))
    }

    fn generate(&self, spec: &KeySpec) -> Result<KeyHandle> {
        validate_alias(spec.alias())?;

        let stored = StoredKey::generate(spec);
        let handle = stored.handle(spec.alias());
        self.write()?.insert(spec.alias().to_string(), stored);
        Ok(handle)
    }

    fn contains(&self, alias: &str) -> Result<bool> {
        Ok(self.read()?.contains_key(alias))
    }

    fn delete(&self, alias: &str) -> Result<()> {
        self.write()?.remove(alias);
        Ok(())
    }

    fn aliases(&self) -> Result<Vec<String>> {
        let mut aliases: Vec<String> = self.read()?.keys().cloned().collect();
        aliases.sort();
        Ok(aliases)
    }

    fn created_at(&self, alias: &str) -> Result<Option<DateTime<Utc>>> {
        Ok(self.read()?.get(alias).map(|stored| stored.created_at))
    }

    fn encrypt(&self, handle: &KeyHandle, plaintext: &[u8]) -> Result<Envelope> {
        self.with_key(handle, |stored| stored.encrypt(plaintext))
    }

    fn decrypt(&self, handle: &KeyHandle, envelope: &Envelope) -> Result<Vec<u8>> {
        self.with_key(handle, |stored| stored.decrypt(envelope))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generate_get_contains_delete() {
        let store = MemoryKeyStore::new();
        assert!(!store.contains("k").unwrap());
        assert!(store.get("k").unwrap().is_none());

        let handle = store.generate(&KeySpec::new("k")).unwrap();
        assert!(store.contains("k").unwrap());
        assert_eq!(store.get("k").unwrap(), Some(handle));
        assert_eq!(store.len().unwrap(), 1);

        store.delete("k").unwrap();
        assert!(!store.contains("k").unwrap());
        assert!(store.is_empty().unwrap());
    }

    #[test]
    fn delete_absent_is_noop() {
        let store = MemoryKeyStore::new();
        store.delete("missing").unwrap();
    }

    #[test]
    fn encrypt_decrypt_with_handle() {
        let store = MemoryKeyStore::new();
        let handle = store.generate(&KeySpec::new("k")).unwrap();
        let env = store.encrypt(&handle, b"payload").unwrap();
        assert_eq!(store.decrypt(&handle, &env).unwrap(), b"payload");
    }

    #[test]
    fn stale_handle_after_regenerate() {
        let store = MemoryKeyStore::new();
        let old = store.generate(&KeySpec::new("k")).unwrap();
        store.delete("k").unwrap();
        let _new = store.generate(&KeySpec::new("k")).unwrap();
        assert!(matches!(
            store.encrypt(&old, b"x"),
            Err(GcmSealError::KeyNotFound(_))
        ));
    }

    #[test]
    fn unavailable_store_fails_every_operation() {
        let store = MemoryKeyStore::new();
        store.set_available(false);
        assert!(matches!(
            store.load(),
            Err(GcmSealError::KeyStoreUnavailable(_))
        ));
        assert!(matches!(
            store.contains("k"),
            Err(GcmSealError::KeyStoreUnavailable(_))
        ));
        assert!(matches!(
            store.generate(&KeySpec::new("k")),
            Err(GcmSealError::KeyStoreUnavailable(_))
        ));

        assert!(matches!(
            store.len(),
            Err(GcmSealError::KeyStoreUnavailable(_))
        ));

        store.set_available(true);
        assert!(store.load().is_ok());
        assert!(store.is_empty().unwrap());
    }

    #[test]
    fn aliases_are_sorted() {
        let store = MemoryKeyStore::new();
        store.generate(&KeySpec::new("b")).unwrap();
        store.generate(&KeySpec::new("a")).unwrap();
        assert_eq!(store.aliases().unwrap(), vec!["a", "b"]);
    }

    #[test]
    fn rejects_invalid_alias() {
        let store = MemoryKeyStore::new();
        assert!(matches!(
            store.generate(&KeySpec::new("bad alias")),
            Err(GcmSealError::InvalidAlias(_))
        ));
    }
}
