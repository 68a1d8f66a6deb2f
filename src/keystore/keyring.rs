//! OS keyring key store.
//!
//! Keeps each key in the operating system's credential store:
//! - macOS: Keychain
//! - Windows: Credential Manager
//! - Linux: Secret Service (GNOME Keyring / KDE Wallet)
//!
//! Each alias is one keyring entry whose secret is a small JSON record
//! (`id` + hex key). Keyrings cannot enumerate entries, so the list of
//! aliases is kept in an extra `.index` entry; `validate_alias` forbids
//! a leading `.`, so it cannot collide with a real alias.

use serde::{Deserialize, Serialize};
use zeroize::{Zeroize, ZeroizeOnDrop};

use super::key_spec::{validate_alias, KeyHandle, KeySpec};
use super::material::StoredKey;
use super::SecureKeyStore;
use crate::crypto::keys::SecretKey;
use crate::envelope::Envelope;
use crate::errors::{GcmSealError, Result};

/// Default keyring service name.
pub const DEFAULT_SERVICE: &str = "gcmseal";

/// Keyring user name of the alias index.
const INDEX_ENTRY: &str = ".index";

#[derive(Serialize, Deserialize, Zeroize, ZeroizeOnDrop)]
struct KeyringRecord {
    #[zeroize(skip)]
    id: String,
    key: String,
}

/// `SecureKeyStore` backed by the OS keyring.
pub struct KeyringKeyStore {
    service: String,
}

impl KeyringKeyStore {
    pub fn new() -> Self {
        Self::with_service(DEFAULT_SERVICE)
    }

    /// Use a custom keyring service name (namespaces the entries).
    pub fn with_service(service: impl Into<String>) -> Self {
        Self {
            service: service.into(),
        }
    }

    fn entry(&self, user: &str) -> Result<keyring::Entry> {
        keyring::Entry::new(&self.service, user).map_err(|e| {
            GcmSealError::KeyStoreUnavailable(format!("failed to create keyring entry: {e}"))
        })
    }

    fn read_secret(&self, user: &str) -> Result<Option<String>> {
        match self.entry(user)?.get_password() {
            Ok(secret) => Ok(Some(secret)),
            Err(keyring::Error::NoEntry) => Ok(None),
            Err(e) => Err(GcmSealError::KeyStoreUnavailable(format!(
                "failed to read from keyring: {e}"
            ))),
        }
    }

    fn read_record(&self, alias: &str) -> Result<Option<KeyringRecord>> {
        let Some(mut secret) = self.read_secret(alias)? else {
            return Ok(None);
        };
        let record = serde_json::from_str(&secret).map_err(|e| {
            GcmSealError::KeyStoreUnavailable(format!("corrupt keyring entry '{alias}': {e}"))
        });
        secret.zeroize();
        record.map(Some)
    }

    fn read_index(&self) -> Result<Vec<String>> {
        match self.read_secret(INDEX_ENTRY)? {
            Some(json) => serde_json::from_str(&json).map_err(|e| {
                GcmSealError::KeyStoreUnavailable(format!("corrupt keyring index: {e}"))
            }),
            None => Ok(Vec::new()),
        }
    }

    fn write_index(&self, aliases: &[String]) -> Result<()> {
        let json = serde_json::to_string(aliases)
            .map_err(|e| GcmSealError::SerializationError(format!("keyring index: {e}")))?;
        self.entry(INDEX_ENTRY)?.set_password(&json).map_err(|e| {
            GcmSealError::KeyStoreUnavailable(format!("failed to update keyring index: {e}"))
        })
    }

    fn remove_entry(&self, user: &str) -> Result<()> {
        match self.entry(user)?.delete_credential() {
            Ok(()) | Err(keyring::Error::NoEntry) => Ok(()),
            Err(e) => Err(GcmSealError::KeyStoreUnavailable(format!(
                "failed to delete from keyring: {e}"
            ))),
        }
    }

    fn find(&self, handle: &KeyHandle) -> Result<StoredKey> {
        let record = self
            .read_record(handle.alias())?
            .ok_or_else(|| GcmSealError::KeyNotFound(handle.alias().to_string()))?;
        let stored = StoredKey {
            id: record.id.clone(),
            key: SecretKey::from_hex(&record.key)?,
            created_at: chrono::Utc::now(),
            user_authentication_required: false,
        };
        stored.check_handle(handle)?;
        Ok(stored)
    }
}

impl Default for KeyringKeyStore {
    fn default() -> Self {
        Self::new()
    }
}

impl SecureKeyStore for KeyringKeyStore {
    fn load(&self) -> Result<()> {
        self.read_index().map(|_| ())
    }

    fn get(&self, alias: &str) -> Result<Option<KeyHandle>> {
        Ok(self
            .read_record(alias)?
            .map(|record| KeyHandle::new(alias, record.id.clone())))
    }

    fn generate(&self, spec: &KeySpec) -> Result<KeyHandle> {
        validate_alias(spec.alias())?;

        if spec.user_authentication_required() {
            return Err(GcmSealError::KeyGenerationFailed(
                "keyring store cannot enforce user authentication".into(),
            ));
        }

        let stored = StoredKey::generate(spec);
        let record = KeyringRecord {
            id: stored.id.clone(),
            key: stored.key.to_hex(),
        };
        let mut json = serde_json::to_string(&record)
            .map_err(|e| GcmSealError::SerializationError(format!("keyring record: {e}")))?;

        let stored_ok = self.entry(spec.alias())?.set_password(&json);
        json.zeroize();
        stored_ok.map_err(|e| {
            GcmSealError::KeyGenerationFailed(format!("failed to store key in keyring: {e}"))
        })?;

        let indexed = self.read_index().and_then(|mut aliases| {
            if aliases.iter().any(|a| a == spec.alias()) {
                return Ok(());
            }
            aliases.push(spec.alias().to_string());
            aliases.sort();
            self.write_index(&aliases)
        });
        undo_on_failure(indexed, || self.remove_entry(spec.alias()))?;

        Ok(stored.handle(spec.alias()))
    }

    fn contains(&self, alias: &str) -> Result<bool> {
        Ok(self.read_secret(alias)?.is_some())
    }

    fn delete(&self, alias: &str) -> Result<()> {
        self.remove_entry(alias)?;

        let mut aliases = self.read_index()?;
        let before = aliases.len();
        aliases.retain(|a| a != alias);
        if aliases.len() != before {
            self.write_index(&aliases)?;
        }
        Ok(())
    }

    fn aliases(&self) -> Result<Vec<String>> {
        self.read_index()
    }

    fn encrypt(&self, handle: &KeyHandle, plaintext: &[u8]) -> Result<Envelope> {
        self.find(handle)?.encrypt(plaintext)
    }

    fn decrypt(&self, handle: &KeyHandle, envelope: &Envelope) -> Result<Vec<u8>> {
        self.find(handle)?.decrypt(envelope)
    }
}

/// Run `undo` when `step` failed, then return the original error.
///
/// `generate` uses this so a key entry never outlives a failed index
/// update: `aliases` could not see it, yet it would still hold key
/// material.
fn undo_on_failure<T>(step: Result<T>, undo: impl FnOnce() -> Result<()>) -> Result<T> {
    step.map_err(|err| {
        if let Err(undo_err) = undo() {
            tracing::warn!(error = %undo_err, "could not roll back keyring entry");
        }
        err
    })
}
