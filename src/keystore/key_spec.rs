//! Key generation parameters and opaque key handles.

use std::fmt;

use crate::errors::{GcmSealError, Result};

/// Longest alias accepted by any backend.
const MAX_ALIAS_LEN: usize = 128;

/// Parameters for generating a stored key.
///
/// Algorithm, purpose, block mode and padding are fixed: every stored key
/// is an AES-256 encrypt/decrypt key used in GCM mode without padding.
/// Only the alias and the authentication requirement vary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeySpec {
    alias: String,
    user_authentication_required: bool,
    randomized_encryption_required: bool,
}

impl KeySpec {
    /// A spec for `alias` with no user-authentication requirement.
    pub fn new(alias: impl Into<String>) -> Self {
        Self {
            alias: alias.into(),
            user_authentication_required: false,
            randomized_encryption_required: true,
        }
    }

    /// Require the user to re-authenticate before the key can be used.
    ///
    /// Turning this on also forces randomized encryption.
    pub fn require_user_authentication(mut self, required: bool) -> Self {
        self.user_authentication_required = required;
        if required {
            self.randomized_encryption_required = true;
        }
        self
    }

    /// Opt out of randomized encryption. Ignored while user
    /// authentication is required.
    pub fn randomized_encryption(mut self, required: bool) -> Self {
        self.randomized_encryption_required = required || self.user_authentication_required;
        self
    }

    pub fn alias(&self) -> &str {
        &self.alias
    }

    pub fn user_authentication_required(&self) -> bool {
        self.user_authentication_required
    }

    pub fn randomized_encryption_required(&self) -> bool {
        self.randomized_encryption_required
    }

    pub fn algorithm(&self) -> &'static str {
        "AES"
    }

    pub fn key_size_bits(&self) -> u32 {
        256
    }

    pub fn block_mode(&self) -> &'static str {
        "GCM"
    }

    pub fn padding(&self) -> &'static str {
        "NoPadding"
    }

    /// Both purposes, always.
    pub fn purposes(&self) -> &'static [&'static str] {
        &["encrypt", "decrypt"]
    }
}

/// Reference to a key held by a `SecureKeyStore`.
///
/// Carries the alias and the id of the generated key, never the key
/// bytes. A handle goes stale once its key is deleted, even if a new key
/// is later created under the same alias.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct KeyHandle {
    alias: String,
    id: String,
}

impl KeyHandle {
    pub(crate) fn new(alias: impl Into<String>, id: impl Into<String>) -> Self {
        Self {
            alias: alias.into(),
            id: id.into(),
        }
    }

    pub fn alias(&self) -> &str {
        &self.alias
    }

    /// Backend-assigned identifier of the underlying key.
    pub fn id(&self) -> &str {
        &self.id
    }
}

impl fmt::Debug for KeyHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "KeyHandle({}#{})", self.alias, self.id)
    }
}

/// Check that an alias is safe to use as a keyring user name or a JSON
/// object key.
///
/// Allowed: ASCII letters, digits, `-`, `_` and `.`, not starting with
/// `.`, 1 to 128 characters.
pub fn validate_alias(alias: &str) -> Result<()> {
    let valid = !alias.is_empty()
        && alias.len() <= MAX_ALIAS_LEN
        && !alias.starts_with('.')
        && alias
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'));

    if valid {
        Ok(())
    } else {
        Err(GcmSealError::InvalidAlias(alias.to_string()))
    }
}
