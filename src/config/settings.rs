use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::crypto::kdf::DEFAULT_ITERATIONS;
use crate::errors::{GcmSealError, Result};

/// Which secure key store backend the CLI talks to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum KeyStoreBackend {
    /// JSON key store under `keystore_dir`.
    File,
    /// OS keyring (requires the `keyring-store` feature).
    Keyring,
}

/// Project-level configuration, loaded from `.gcmseal.toml`.
///
/// Every field has a sensible default so gcmseal works out-of-the-box
/// without any config file at all.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    /// PBKDF2 iteration count (default: 50 000).
    ///
    /// Lowering it weakens every passphrase-derived key; the CLI warns
    /// when it is set below the default.
    #[serde(default = "default_kdf_iterations")]
    pub kdf_iterations: u32,

    /// Directory (relative to project root) of the file key store.
    #[serde(default = "default_keystore_dir")]
    pub keystore_dir: String,

    /// Key store backend used by `gcmseal key ...`.
    #[serde(default = "default_keystore_backend")]
    pub keystore_backend: KeyStoreBackend,

    /// Print hex output with a leading `0x`.
    #[serde(default)]
    pub hex_prefix: bool,
}

// ── Serde default helpers ────────────────────────────────────────────

fn default_kdf_iterations() -> u32 {
    DEFAULT_ITERATIONS
}

fn default_keystore_dir() -> String {
    ".gcmseal/keys".to_string()
}

fn default_keystore_backend() -> KeyStoreBackend {
    KeyStoreBackend::File
}

// ── Implementation ───────────────────────────────────────────────────

impl Default for Settings {
    fn default() -> Self {
        Self {
            kdf_iterations: default_kdf_iterations(),
            keystore_dir: default_keystore_dir(),
            keystore_backend: default_keystore_backend(),
            hex_prefix: false,
        }
    }
}

impl Settings {
    /// Name of the config file we look for in the project root.
    const FILE_NAME: &'static str = ".gcmseal.toml";

    /// Load settings from `<project_dir>/.gcmseal.toml`.
    ///
    /// If the file does not exist, sensible defaults are returned.
    /// If the file exists but cannot be parsed, an error is returned.
    pub fn load(project_dir: &Path) -> Result<Self> {
        let config_path = project_dir.join(Self::FILE_NAME);

        if !config_path.exists() {
            return Ok(Self::default());
        }

        let contents = std::fs::read_to_string(&config_path)?;

        let settings: Settings = toml::from_str(&contents).map_err(|e| {
            GcmSealError::ConfigError(format!("Failed to parse {}: {e}", config_path.display()))
        })?;

        settings.validate()?;
        Ok(settings)
    }

    /// Reject values no derivation can use.
    pub fn validate(&self) -> Result<()> {
        if self.kdf_iterations == 0 {
            return Err(GcmSealError::ConfigError(
                "kdf_iterations must be at least 1".into(),
            ));
        }
        Ok(())
    }

    /// Whether the configured iteration count is below the default.
    pub fn weak_kdf(&self) -> bool {
        self.kdf_iterations < DEFAULT_ITERATIONS
    }

    /// Full path of the file key store directory.
    ///
    /// Example: `project_dir/.gcmseal/keys`
    pub fn keystore_path(&self, project_dir: &Path) -> PathBuf {
        project_dir.join(&self.keystore_dir)
    }
}

// ── Tests ────────────────────────────────────────────────────────────
