//! Key material for the software-emulated backends.
//!
//! The memory and file stores keep the raw key in process memory, so
//! they share this type: it owns the key, assigns the handle id, and does
//! the AEAD work with a nonce it draws itself.

use chrono::{DateTime, Utc};
use rand::RngCore;

use super::key_spec::{KeyHandle, KeySpec};
use crate::crypto::cipher;
use crate::crypto::keys::SecretKey;
use crate::encoding::hex;
use crate::envelope::Envelope;
use crate::errors::{GcmSealError, Result};

/// Random bytes in a key id.
const KEY_ID_LEN: usize = 8;

/// A key held by a software store.
pub(crate) struct StoredKey {
    pub id: String,
    pub key: SecretKey,
    pub created_at: DateTime<Utc>,
    pub user_authentication_required: bool,
}

impl StoredKey {
    /// Generate a fresh key for `spec`.
    pub fn generate(spec: &KeySpec) -> Self {
        Self {
            id: new_key_id(),
            key: SecretKey::generate(),
            created_at: Utc::now(),
            user_authentication_required: spec.user_authentication_required(),
        }
    }

    pub fn handle(&self, alias: &str) -> KeyHandle {
        KeyHandle::new(alias, self.id.clone())
    }

    /// Fail with `KeyNotFound` if `handle` refers to a different
    /// (deleted) generation of this alias.
    pub fn check_handle(&self, handle: &KeyHandle) -> Result<()> {
        if handle.id() == self.id {
            Ok(())
        } else {
            Err(GcmSealError::KeyNotFound(handle.alias().to_string()))
        }
    }

    /// Encrypt under this key with a fresh random nonce.
    pub fn encrypt(&self, plaintext: &[u8]) -> Result<Envelope> {
        self.note_user_authentication();
        Envelope::seal_with_nonce(plaintext, self.key.as_bytes(), cipher::generate_nonce())
    }

    pub fn decrypt(&self, envelope: &Envelope) -> Result<Vec<u8>> {
        self.note_user_authentication();
        envelope.open(self.key.as_bytes())
    }

    // Software stores have nothing to prompt with.
    fn note_user_authentication(&self) {
        if self.user_authentication_required {
            tracing::debug!(id = %self.id, "user authentication not enforced by software key store");
        }
    }
}

fn new_key_id() -> String {
    let mut id = [0u8; KEY_ID_LEN];
    rand::rng().fill_bytes(&mut id);
    hex::encode(&id)
}
