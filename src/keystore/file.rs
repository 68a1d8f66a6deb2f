//! File-backed key store.
//!
//! A software key store that survives process restarts. All keys live in
//! one JSON document:
//!
//! ```text
//! <dir>/keystore.json
//! { "version": 1, "keys": { "<alias>": { "id", "key" (hex), "created_at" } } }
//! ```
//!
//! The directory is kept owner-only (0700), tightened on `load` if it
//! already existed with wider access. The file is created owner-only
//! (0600) as a temp file and renamed into place, so readers never see a
//! half-written store. The document is re-read on every operation;
//! nothing is cached between calls.
//!
//! This backend cannot enforce user presence, so specs that require
//! user authentication are refused.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use zeroize::{Zeroize, ZeroizeOnDrop};

use super::key_spec::{validate_alias, KeyHandle, KeySpec};
use super::material::StoredKey;
use super::SecureKeyStore;
use crate::crypto::keys::SecretKey;
use crate::envelope::Envelope;
use crate::errors::{GcmSealError, Result};

/// Name of the key store document inside the store directory.
const FILE_NAME: &str = "keystore.json";

/// Current document version.
const CURRENT_VERSION: u8 = 1;

#[derive(Serialize, Deserialize)]
struct KeyStoreFile {
    version: u8,
    #[serde(default)]
    keys: BTreeMap<String, FileEntry>,
}

impl Default for KeyStoreFile {
    fn default() -> Self {
        Self {
            version: CURRENT_VERSION,
            keys: BTreeMap::new(),
        }
    }
}

#[derive(Serialize, Deserialize, Zeroize, ZeroizeOnDrop)]
struct FileEntry {
    #[zeroize(skip)]
    id: String,
    /// Hex-encoded 32-byte key.
    key: String,
    #[zeroize(skip)]
    created_at: DateTime<Utc>,
}

impl FileEntry {
    fn from_stored(stored: &StoredKey) -> Self {
        Self {
            id: stored.id.clone(),
            key: stored.key.to_hex(),
            created_at: stored.created_at,
        }
    }

    fn to_stored(&self, alias: &str) -> Result<StoredKey> {
        let key = SecretKey::from_hex(&self.key).map_err(|e| {
            GcmSealError::KeyStoreUnavailable(format!("corrupt key entry '{alias}': {e}"))
        })?;
        Ok(StoredKey {
            id: self.id.clone(),
            key,
            created_at: self.created_at,
            user_authentication_required: false,
        })
    }
}

/// Directory-backed `SecureKeyStore`.
pub struct FileKeyStore {
    dir: PathBuf,
}

impl FileKeyStore {
    /// A store rooted at `dir`. Nothing touches disk until `load`.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Path of the JSON document.
    pub fn file_path(&self) -> PathBuf {
        self.dir.join(FILE_NAME)
    }

    fn read(&self) -> Result<KeyStoreFile> {
        let path = self.file_path();
        if !path.exists() {
            return Ok(KeyStoreFile::default());
        }

        let data = fs::read(&path).map_err(|e| unavailable(&path, e))?;
        let file: KeyStoreFile = serde_json::from_slice(&data).map_err(|e| unavailable(&path, e))?;

        if file.version != CURRENT_VERSION {
            return Err(GcmSealError::KeyStoreUnavailable(format!(
                "{}: unsupported version {}, expected {CURRENT_VERSION}",
                path.display(),
                file.version
            )));
        }

        Ok(file)
    }

    /// Write the document atomically: temp file in the same directory,
    /// then rename over the target.
    fn write(&self, file: &KeyStoreFile) -> Result<()> {
        let path = self.file_path();
        let mut bytes = serde_json::to_vec_pretty(file)
            .map_err(|e| GcmSealError::SerializationError(format!("key store: {e}")))?;

        let tmp_path = self.dir.join(format!(".{FILE_NAME}.tmp"));
        let written = write_private(&tmp_path, &bytes);
        bytes.zeroize();
        if let Err(e) = written {
            let _ = fs::remove_file(&tmp_path);
            return Err(e.into());
        }

        fs::rename(&tmp_path, &path)?;
        Ok(())
    }

    fn find(&self, handle: &KeyHandle) -> Result<StoredKey> {
        let file = self.read()?;
        let entry = file
            .keys
            .get(handle.alias())
            .ok_or_else(|| GcmSealError::KeyNotFound(handle.alias().to_string()))?;
        let stored = entry.to_stored(handle.alias())?;
        stored.check_handle(handle)?;
        Ok(stored)
    }
}

impl SecureKeyStore for FileKeyStore {
    fn load(&self) -> Result<()> {
        if !self.dir.exists() {
            fs::create_dir_all(&self.dir).map_err(|e| unavailable(&self.dir, e))?;
            restrict_permissions(&self.dir, 0o700).map_err(|e| unavailable(&self.dir, e))?;
        } else if !self.dir.is_dir() {
            return Err(GcmSealError::KeyStoreUnavailable(format!(
                "{} is not a directory",
                self.dir.display()
            )));
        } else {
            tighten_dir(&self.dir).map_err(|e| unavailable(&self.dir, e))?;
        }

        self.read().map(|_| ())
    }

    fn get(&self, alias: &str) -> Result<Option<KeyHandle>> {
        Ok(self
            .read()?
            .keys
            .get(alias)
            .map(|entry| KeyHandle::new(alias, entry.id.clone())))
    }

    fn generate(&self, spec: &KeySpec) -> Result<KeyHandle> {
        validate_alias(spec.alias())?;

        if spec.user_authentication_required() {
            return Err(GcmSealError::KeyGenerationFailed(
                "file key store cannot enforce user authentication".into(),
            ));
        }

        let mut file = self.read()?;
        let stored = StoredKey::generate(spec);
        file.keys
            .insert(spec.alias().to_string(), FileEntry::from_stored(&stored));

        self.write(&file)
            .map_err(|e| GcmSealError::KeyGenerationFailed(format!("persisting key: {e}")))?;

        Ok(stored.handle(spec.alias()))
    }

    fn contains(&self, alias: &str) -> Result<bool> {
        Ok(self.read()?.keys.contains_key(alias))
    }

    fn delete(&self, alias: &str) -> Result<()> {
        let mut file = self.read()?;
        if file.keys.remove(alias).is_some() {
            self.write(&file)?;
        }
        Ok(())
    }

    fn aliases(&self) -> Result<Vec<String>> {
        Ok(self.read()?.keys.keys().cloned().collect())
    }

    fn created_at(&self, alias: &str) -> Result<Option<DateTime<Utc>>> {
        Ok(self.read()?.keys.get(alias).map(|entry| entry.created_at))
    }

    fn encrypt(&self, handle: &KeyHandle, plaintext: &[u8]) -> Result<Envelope> {
        self.find(handle)?.encrypt(plaintext)
    }

    fn decrypt(&self, handle: &KeyHandle, envelope: &Envelope) -> Result<Vec<u8>> {
        self.find(handle)?.decrypt(envelope)
    }
}

fn unavailable(path: &Path, e: impl std::fmt::Display) -> GcmSealError {
    GcmSealError::KeyStoreUnavailable(format!("{}: {e}", path.display()))
}

/// Create `path` owner-only (0600) and write `bytes` to it.
///
/// The mode is set at creation, so the contents are never visible to
/// other users. A leftover file from an interrupted write is replaced.
fn write_private(path: &Path, bytes: &[u8]) -> std::io::Result<()> {
    use std::io::Write;

    match fs::remove_file(path) {
        Ok(()) => {}
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
        Err(e) => return Err(e),
    }

    let mut options = fs::OpenOptions::new();
    options.write(true).create_new(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        options.mode(0o600);
    }

    let mut file = options.open(path)?;
    file.write_all(bytes)?;
    file.sync_all()
}

/// Drop group/other access from an existing store directory.
fn tighten_dir(dir: &Path) -> Result<()> {
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        let mode = fs::metadata(dir)?.permissions().mode();
        if mode & 0o077 != 0 {
            tracing::warn!(
                dir = %dir.display(),
                mode = format_args!("{:o}", mode & 0o777),
                "key store directory was accessible to other users; restricting to 0700"
            );
            restrict_permissions(dir, 0o700)?;
        }
    }

    #[cfg(not(unix))]
    let _ = dir;

    Ok(())
}

fn restrict_permissions(path: &Path, mode: u32) -> Result<()> {
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        fs::set_permissions(path, fs::Permissions::from_mode(mode))?;
    }

    #[cfg(not(unix))]
    let _ = (path, mode);

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn store(dir: &TempDir) -> FileKeyStore {
        let store = FileKeyStore::new(dir.path().join("keys"));
        store.load().unwrap();
        store
    }

    #[test]
    fn load_creates_directory() {
        let dir = TempDir::new().unwrap();
        let store = store(&dir);
        assert!(store.dir().is_dir());
        assert!(!store.file_path().exists(), "file is written lazily");
    }

    #[test]
    fn keys_persist_across_instances() {
        let dir = TempDir::new().unwrap();
        let first = store(&dir);
        let handle = first.generate(&KeySpec::new("wallet")).unwrap();
        let env = first.encrypt(&handle, b"seed").unwrap();
        drop(first);

        let second = store(&dir);
        assert_eq!(second.get("wallet").unwrap(), Some(handle.clone()));
        assert_eq!(second.decrypt(&handle, &env).unwrap(), b"seed");
        assert!(second.created_at("wallet").unwrap().is_some());
    }

    #[test]
    fn delete_rewrites_file() {
        let dir = TempDir::new().unwrap();
        let store = store(&dir);
        store.generate(&KeySpec::new("a")).unwrap();
        store.generate(&KeySpec::new("b")).unwrap();

        store.delete("a").unwrap();
        assert_eq!(store.aliases().unwrap(), vec!["b"]);

        let again = FileKeyStore::new(store.dir());
        assert!(!again.contains("a").unwrap());
        assert!(again.contains("b").unwrap());
    }

    #[test]
    fn delete_absent_does_not_create_file() {
        let dir = TempDir::new().unwrap();
        let store = store(&dir);
        store.delete("missing").unwrap();
        assert!(!store.file_path().exists());
    }

    #[test]
    fn refuses_user_authentication() {
        let dir = TempDir::new().unwrap();
        let store = store(&dir);
        let spec = KeySpec::new("bio").require_user_authentication(true);
        assert!(matches!(
            store.generate(&spec),
            Err(GcmSealError::KeyGenerationFailed(_))
        ));
        assert!(!store.contains("bio").unwrap());
    }

    #[cfg(unix)]
    fn mode_of(path: &Path) -> u32 {
        use std::os::unix::fs::PermissionsExt;
        fs::metadata(path).unwrap().permissions().mode() & 0o777
    }

    #[cfg(unix)]
    #[test]
    fn load_tightens_existing_open_directory() {
        use std::os::unix::fs::PermissionsExt;

        let dir = TempDir::new().unwrap();
        let keys = dir.path().join("keys");
        fs::create_dir(&keys).unwrap();
        fs::set_permissions(&keys, fs::Permissions::from_mode(0o755)).unwrap();

        let store = FileKeyStore::new(&keys);
        store.load().unwrap();
        assert_eq!(mode_of(&keys), 0o700);
    }

    #[cfg(unix)]
    #[test]
    fn document_is_owner_only_from_creation() {
        use std::os::unix::fs::PermissionsExt;

        let dir = TempDir::new().unwrap();
        let store = store(&dir);

        // Left behind by an interrupted write, with loose permissions.
        let stale = store.dir().join(format!(".{FILE_NAME}.tmp"));
        fs::write(&stale, b"stale").unwrap();
        fs::set_permissions(&stale, fs::Permissions::from_mode(0o644)).unwrap();

        store.generate(&KeySpec::new("wallet")).unwrap();

        assert_eq!(mode_of(&store.file_path()), 0o600);
        assert!(!stale.exists());
    }

    #[cfg(unix)]
    #[test]
    fn write_private_creates_0600_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("secret");
        write_private(&path, b"key material").unwrap();
        assert_eq!(mode_of(&path), 0o600);
        assert_eq!(fs::read(&path).unwrap(), b"key material");
    }

    #[test]
    fn load_fails_when_path_is_a_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("not-a-dir");
        fs::write(&path, b"x").unwrap();

        let store = FileKeyStore::new(&path);
        assert!(matches!(
            store.load(),
            Err(GcmSealError::KeyStoreUnavailable(_))
        ));
    }

    #[test]
    fn corrupt_document_is_unavailable() {
        let dir = TempDir::new().unwrap();
        let store = store(&dir);
        fs::write(store.file_path(), b"{ not json").unwrap();
        assert!(matches!(
            store.load(),
            Err(GcmSealError::KeyStoreUnavailable(_))
        ));
    }

    #[test]
    fn unsupported_version_is_unavailable() {
        let dir = TempDir::new().unwrap();
        let store = store(&dir);
        fs::write(store.file_path(), br#"{"version": 9, "keys": {}}"#).unwrap();
        assert!(matches!(
            store.contains("x"),
            Err(GcmSealError::KeyStoreUnavailable(_))
        ));
    }

    #[cfg(unix)]
    #[test]
    fn file_is_owner_only() {
        use std::os::unix::fs::PermissionsExt;

        let dir = TempDir::new().unwrap();
        let store = store(&dir);
        store.generate(&KeySpec::new("k")).unwrap();

        let mode = fs::metadata(store.file_path()).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o600);
        let mode = fs::metadata(store.dir()).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o700);
    }
}
