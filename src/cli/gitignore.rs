//! Keep a project-local file key store out of version control.
//!
//! `key create` calls [`protect_keystore`] after the store exists. Only
//! the top-level directory the store lives under is ignored, so the
//! default `.gcmseal/keys` becomes `.gcmseal/`.

use std::fs;
use std::io;
use std::path::Path;

/// What [`protect_keystore`] did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GitignoreUpdate {
    /// `entry` was appended to `.gitignore`.
    Added(String),
    /// An existing line already covers the key store.
    AlreadyIgnored(String),
    /// The key store is outside the project; nothing to ignore.
    OutsideProject,
}

/// Make sure `.gitignore` in `project_dir` covers `keystore_dir`.
pub fn protect_keystore(project_dir: &Path, keystore_dir: &Path) -> io::Result<GitignoreUpdate> {
    let Some(entry) = entry_for(project_dir, keystore_dir) else {
        return Ok(GitignoreUpdate::OutsideProject);
    };

    let path = project_dir.join(".gitignore");
    let existing = match fs::read_to_string(&path) {
        Ok(text) => text,
        Err(e) if e.kind() == io::ErrorKind::NotFound => String::new(),
        Err(e) => return Err(e),
    };

    if existing.lines().any(|line| covers(line, &entry)) {
        return Ok(GitignoreUpdate::AlreadyIgnored(entry));
    }

    let separator = if existing.is_empty() || existing.ends_with('\n') {
        ""
    } else {
        "\n"
    };
    fs::write(&path, format!("{existing}{separator}{entry}\n"))?;
    tracing::debug!(entry, "added key store to .gitignore");

    Ok(GitignoreUpdate::Added(entry))
}

/// `.gitignore` entry for the top-level directory holding the store,
/// or `None` when the store is not under `project_dir`.
fn entry_for(project_dir: &Path, keystore_dir: &Path) -> Option<String> {
    let relative = keystore_dir.strip_prefix(project_dir).ok()?;
    let first = relative.components().next()?;
    Some(format!("{}/", first.as_os_str().to_string_lossy()))
}

/// Whether a `.gitignore` line ignores the directory `entry` (`name/`).
///
/// `.gcmseal`, `/.gcmseal` and `/.gcmseal/` all count. Negations and
/// comments never do.
fn covers(line: &str, entry: &str) -> bool {
    let line = line.trim();
    if line.is_empty() || line.starts_with('#') || line.starts_with('!') {
        return false;
    }
    let name = entry.trim_end_matches('/');
    line.trim_start_matches('/').trim_end_matches('/') == name
}
