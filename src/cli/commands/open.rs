//! `gcmseal open` — open a hex envelope.
//!
//! Every failure after argument parsing (bad key, bad hex, wrong key,
//! tampering) prints the same "Unable to decrypt data".

use zeroize::Zeroizing;

use crate::cli::{load_settings, print_plaintext, read_input, resolve_secret};
use crate::cli::{SecretArgs, SecretUse};
use crate::envelope;
use crate::errors::Result;

/// Execute the `open` command.
pub fn execute(input: Option<&str>, secret: &SecretArgs, as_hex: bool) -> Result<()> {
    let settings = load_settings()?;
    let key = resolve_secret(secret, &settings, SecretUse::Open)?;
    let text = read_input(input, "envelope")?;

    let plaintext = Zeroizing::new(envelope::open_hex(&text, &key)?);
    print_plaintext(&plaintext, as_hex, &settings)
}
