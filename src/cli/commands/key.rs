//! `gcmseal key` — manage keys in the secure key store.
//!
//! The backend comes from `keystore_backend` in `.gcmseal.toml`. Every
//! action goes through `KeyStoreManager`, so concurrent `gcmseal key`
//! calls inside one process never interleave.

use dialoguer::Confirm;
use zeroize::Zeroizing;

use crate::cli::gitignore::GitignoreUpdate;
use crate::cli::output;
use crate::cli::{display_hex, gitignore, keystore_dir, load_settings, print_plaintext};
use crate::cli::{read_input, Cli, KeyAction};
use crate::config::{KeyStoreBackend, Settings};
use crate::errors::{GcmSealError, Result};
use crate::keystore::{FileKeyStore, KeySpec, KeyStoreManager, SecureKeyStore};

/// Execute a `key` subcommand.
pub fn execute(cli: &Cli, action: &KeyAction) -> Result<()> {
    let settings = load_settings()?;

    match settings.keystore_backend {
        KeyStoreBackend::File => {
            let dir = keystore_dir(cli, &settings)?;
            let manager = KeyStoreManager::new(FileKeyStore::new(&dir));
            run(&manager, action, &settings)?;

            if matches!(action, KeyAction::Create { .. }) {
                let cwd = std::env::current_dir()?;
                // A failed .gitignore update does not undo a created key.
                match gitignore::protect_keystore(&cwd, &dir) {
                    Ok(GitignoreUpdate::Added(entry)) => {
                        output::info(&format!("Added '{entry}' to .gitignore"));
                    }
                    Ok(_) => {}
                    Err(e) => output::warning(&format!("Could not update .gitignore: {e}")),
                }
            }
            Ok(())
        }
        KeyStoreBackend::Keyring => run_keyring(action, &settings),
    }
}

#[cfg(feature = "keyring-store")]
fn run_keyring(action: &KeyAction, settings: &Settings) -> Result<()> {
    let manager = KeyStoreManager::new(crate::keystore::KeyringKeyStore::new());
    run(&manager, action, settings)
}

#[cfg(not(feature = "keyring-store"))]
fn run_keyring(_action: &KeyAction, _settings: &Settings) -> Result<()> {
    Err(GcmSealError::ConfigError(
        "keystore_backend = \"keyring\" requires gcmseal built with the `keyring-store` feature"
            .into(),
    ))
}

fn run<S: SecureKeyStore>(
    manager: &KeyStoreManager<S>,
    action: &KeyAction,
    settings: &Settings,
) -> Result<()> {
    match action {
        KeyAction::Create { alias, user_auth } => {
            let spec = KeySpec::new(alias.as_str()).require_user_authentication(*user_auth);

            // One lock acquisition so the report matches what happened.
            let (existed, handle) = manager.exclusive(|m| {
                let existed = m.contains(alias)?;
                Ok((existed, m.get_or_create(&spec)?))
            })?;

            if existed {
                output::info(&format!("Key '{alias}' already exists."));
            } else {
                output::success(&format!("Created key '{}'", handle.alias()));
            }
        }

        KeyAction::Exists { alias } => {
            println!("{}", manager.contains(alias)?);
        }

        KeyAction::Delete { alias, force } => {
            if !*force {
                let confirmed = Confirm::new()
                    .with_prompt(format!("Delete key '{alias}'? Data sealed with it is lost."))
                    .default(false)
                    .interact()
                    .map_err(|e| GcmSealError::CommandFailed(format!("confirm prompt: {e}")))?;

                if !confirmed {
                    output::info("Cancelled.");
                    return Ok(());
                }
            }

            manager.delete(alias)?;
            output::success(&format!("Deleted key '{alias}'"));
        }

        KeyAction::List => {
            output::print_keys_table(&manager.inventory()?);
        }

        KeyAction::Seal { alias, input } => {
            let plaintext = Zeroizing::new(read_input(input.as_deref(), "plaintext")?);
            let sealed = manager.seal(alias, plaintext.as_bytes())?;
            println!("{}", display_hex(&sealed, settings));
        }

        KeyAction::Open {
            alias,
            envelope,
            hex: as_hex,
        } => {
            let text = read_input(envelope.as_deref(), "envelope")?;
            let plaintext = Zeroizing::new(manager.open_hex(alias, &text)?);
            print_plaintext(&plaintext, *as_hex, settings)?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::keystore::{MemoryKeyStore, StoreLock};
    use std::sync::Arc;

    fn manager() -> KeyStoreManager<MemoryKeyStore> {
        KeyStoreManager::with_lock(MemoryKeyStore::new(), Arc::new(StoreLock::new()))
    }

    #[test]
    fn create_then_delete_through_run() {
        let m = manager();
        let settings = Settings::default();

        let create = KeyAction::Create {
            alias: "app".into(),
            user_auth: false,
        };
        run(&m, &create, &settings).unwrap();
        run(&m, &create, &settings).unwrap();
        assert_eq!(m.store().len().unwrap(), 1);

        let delete = KeyAction::Delete {
            alias: "app".into(),
            force: true,
        };
        run(&m, &delete, &settings).unwrap();
        assert!(m.store().is_empty().unwrap());
    }

    #[test]
    fn seal_on_missing_alias_fails() {
        let m = manager();
        let seal = KeyAction::Seal {
            alias: "missing".into(),
            input: Some("hi".into()),
        };
        assert!(matches!(
            run(&m, &seal, &Settings::default()),
            Err(GcmSealError::KeyNotFound(_))
        ));
    }

    #[test]
    fn open_reports_bad_hex_as_decrypt_failure() {
        let m = manager();
        m.get_or_create(&KeySpec::new("app")).unwrap();
        for bad in ["zz", "0xzz", "abc"] {
            let open = KeyAction::Open {
                alias: "app".into(),
                envelope: Some(bad.into()),
                hex: false,
            };
            assert!(matches!(
                run(&m, &open, &Settings::default()),
                Err(GcmSealError::UnableToDecryptData)
            ));
        }
    }
}
