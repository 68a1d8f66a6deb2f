//! CLI module — Clap argument parser, output helpers, and command implementations.

pub mod commands;
pub mod gitignore;
pub mod output;

use std::io::{self, IsTerminal, Read};
use std::path::PathBuf;

use clap::Parser;
use zeroize::Zeroizing;

use crate::config::Settings;
use crate::crypto::keys::SecretKey;
use crate::encoding::hex;
use crate::errors::{GcmSealError, Result};

/// Environment variable consulted before prompting for a passphrase.
pub const PASSPHRASE_ENV: &str = "GCMSEAL_PASSPHRASE";

/// gcmseal CLI: AES-256-GCM envelopes and secure key store management.
#[derive(Parser)]
#[command(
    name = "gcmseal",
    about = "AES-256-GCM envelope encryption and key store manager",
    version
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Key store directory (overrides keystore_dir in .gcmseal.toml)
    #[arg(long, global = true)]
    pub keystore_dir: Option<String>,
}

/// All available subcommands.
#[derive(clap::Subcommand)]
pub enum Commands {
    /// Seal data into a hex envelope (nonce ‖ tag ‖ ciphertext)
    Seal {
        /// Text to seal (read from stdin if omitted)
        input: Option<String>,

        #[command(flatten)]
        secret: SecretArgs,
    },

    /// Open a hex envelope
    Open {
        /// Hex envelope (read from stdin if omitted)
        envelope: Option<String>,

        #[command(flatten)]
        secret: SecretArgs,

        /// Print the plaintext as hex instead of text
        #[arg(long)]
        hex: bool,
    },

    /// Derive a 32-byte key from a passphrase with PBKDF2-HMAC-SHA256
    Derive {
        /// Hex salt (a random 32-byte salt is generated if omitted)
        #[arg(long)]
        salt: Option<String>,

        /// PBKDF2 iteration count (default: kdf_iterations from config)
        #[arg(long)]
        iterations: Option<u32>,
    },

    /// Hex encode or decode
    Hex {
        #[command(subcommand)]
        action: HexAction,
    },

    /// Manage keys in the secure key store
    Key {
        #[command(subcommand)]
        action: KeyAction,
    },

    /// Show version information
    Version,

    /// Generate shell completion scripts
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: clap_complete::Shell,
    },
}

/// Where the encryption key comes from.
#[derive(clap::Args, Debug, Clone)]
pub struct SecretArgs {
    /// Hex-encoded 32-byte key
    #[arg(short, long, env = "GCMSEAL_KEY", hide_env_values = true)]
    pub key: Option<String>,

    /// Derive the key from a passphrase (GCMSEAL_PASSPHRASE or prompt)
    #[arg(short, long, conflicts_with = "key", requires = "salt")]
    pub passphrase: bool,

    /// Hex salt for passphrase derivation
    #[arg(long)]
    pub salt: Option<String>,

    /// PBKDF2 iteration count (default: kdf_iterations from config)
    #[arg(long)]
    pub iterations: Option<u32>,
}

/// Hex subcommands.
#[derive(clap::Subcommand)]
pub enum HexAction {
    /// Encode text as hex
    Encode {
        /// Text to encode
        text: String,
        /// Prefix the output with 0x
        #[arg(long)]
        prefix: bool,
    },

    /// Decode hex into text
    Decode {
        /// Hex string (optional 0x prefix)
        hex: String,
    },
}

/// Key store subcommands.
#[derive(clap::Subcommand)]
pub enum KeyAction {
    /// Create a key under an alias (no-op if it already exists)
    Create {
        /// Key alias
        alias: String,
        /// Require user authentication to use the key
        #[arg(long)]
        user_auth: bool,
    },

    /// Check whether a key exists
    Exists {
        /// Key alias
        alias: String,
    },

    /// Delete a key
    Delete {
        /// Key alias
        alias: String,
        /// Skip confirmation prompt
        #[arg(short, long)]
        force: bool,
    },

    /// List stored key aliases
    List,

    /// Seal data with a stored key
    Seal {
        /// Key alias
        alias: String,
        /// Text to seal (read from stdin if omitted)
        input: Option<String>,
    },

    /// Open an envelope with a stored key
    Open {
        /// Key alias
        alias: String,
        /// Hex envelope (read from stdin if omitted)
        envelope: Option<String>,
        /// Print the plaintext as hex instead of text
        #[arg(long)]
        hex: bool,
    },
}

// ---------------------------------------------------------------------------
// Shared helpers used by multiple commands
// ---------------------------------------------------------------------------

/// Load `.gcmseal.toml` from the current directory.
pub fn load_settings() -> Result<Settings> {
    let cwd = std::env::current_dir()?;
    Settings::load(&cwd)
}

/// Absolute key store directory: `--keystore-dir` if given (relative to
/// the current directory), else from settings.
pub fn keystore_dir(cli: &Cli, settings: &Settings) -> Result<PathBuf> {
    let cwd = std::env::current_dir()?;
    match &cli.keystore_dir {
        Some(dir) => Ok(cwd.join(dir)),
        None => Ok(settings.keystore_path(&cwd)),
    }
}

/// Use the given argument, or read all of stdin when it is piped.
///
/// Trailing newlines from stdin are dropped.
pub fn read_input(arg: Option<&str>, what: &str) -> Result<String> {
    if let Some(value) = arg {
        return Ok(value.to_string());
    }

    if io::stdin().is_terminal() {
        return Err(GcmSealError::CommandFailed(format!(
            "no {what} given — pass it as an argument or pipe it on stdin"
        )));
    }

    let mut buf = String::new();
    io::stdin().read_to_string(&mut buf)?;
    Ok(buf.trim_end_matches(['\r', '\n']).to_string())
}

/// Get the passphrase, trying in order:
/// 1. `GCMSEAL_PASSPHRASE` env var (CI/CD)
/// 2. Interactive prompt
///
/// Returns `Zeroizing<String>` so the passphrase is wiped from memory on drop.
pub fn prompt_passphrase() -> Result<Zeroizing<String>> {
    if let Ok(pw) = std::env::var(PASSPHRASE_ENV) {
        if !pw.is_empty() {
            return Ok(Zeroizing::new(pw));
        }
    }

    let pw = dialoguer::Password::new()
        .with_prompt("Enter passphrase")
        .interact()
        .map_err(|e| GcmSealError::CommandFailed(format!("passphrase prompt: {e}")))?;
    Ok(Zeroizing::new(pw))
}

/// Iteration count from the flag or the settings, warning when it is
/// below the default.
pub fn resolve_iterations(flag: Option<u32>, settings: &Settings) -> Result<u32> {
    let iterations = flag.unwrap_or(settings.kdf_iterations);
    if iterations == 0 {
        return Err(GcmSealError::CommandFailed(
            "iteration count must be at least 1".into(),
        ));
    }
    if iterations < crate::crypto::kdf::DEFAULT_ITERATIONS {
        output::warning(&format!(
            "Using {iterations} PBKDF2 iterations — below the default of {}.",
            crate::crypto::kdf::DEFAULT_ITERATIONS
        ));
    }
    Ok(iterations)
}

/// Which way the resolved secret is about to be used.
///
/// A secret that fails to parse is reported with that direction's opaque
/// error, the same one a wrong key or a bad tag produces.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SecretUse {
    Seal,
    Open,
}

impl SecretUse {
    fn failure(self, cause: GcmSealError) -> GcmSealError {
        tracing::debug!(%cause, "secret rejected");
        match self {
            SecretUse::Seal => GcmSealError::UnableToEncryptData,
            SecretUse::Open => GcmSealError::UnableToDecryptData,
        }
    }
}

/// Build the encryption key from `--key` or `--passphrase`.
///
/// Only a missing key source is a usage error; a malformed `--key` or
/// `--salt` comes back as `use_for`'s opaque error.
pub fn resolve_secret(
    args: &SecretArgs,
    settings: &Settings,
    use_for: SecretUse,
) -> Result<SecretKey> {
    if let Some(key) = &args.key {
        return SecretKey::from_hex(key).map_err(|e| use_for.failure(e));
    }

    if args.passphrase {
        let salt_hex = args
            .salt
            .as_deref()
            .ok_or_else(|| GcmSealError::CommandFailed("--passphrase requires --salt".into()))?;
        let salt = hex::decode(salt_hex).map_err(|e| use_for.failure(e))?;
        let iterations = resolve_iterations(args.iterations, settings)?;
        let passphrase = prompt_passphrase()?;
        return Ok(SecretKey::derive(passphrase.as_bytes(), &salt, iterations));
    }

    Err(GcmSealError::CommandFailed(
        "no key given — use --key <HEX> (or GCMSEAL_KEY) or --passphrase --salt <HEX>".into(),
    ))
}

/// Hex-encode for display, honouring the `hex_prefix` setting.
pub fn display_hex(bytes: &[u8], settings: &Settings) -> String {
    if settings.hex_prefix {
        hex::encode_prefixed(bytes)
    } else {
        hex::encode(bytes)
    }
}

/// Print opened plaintext: as text, or as hex with `--hex`.
pub fn print_plaintext(plaintext: &[u8], as_hex: bool, settings: &Settings) -> Result<()> {
    if as_hex {
        println!("{}", display_hex(plaintext, settings));
        return Ok(());
    }

    let text = std::str::from_utf8(plaintext).map_err(|_| {
        GcmSealError::CommandFailed("plaintext is not valid UTF-8 — rerun with --hex".into())
    })?;
    println!("{text}");
    Ok(())
}
