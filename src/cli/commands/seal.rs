//! `gcmseal seal` — seal text into a hex envelope.

use zeroize::Zeroizing;

use crate::cli::{display_hex, load_settings, read_input, resolve_secret, SecretArgs, SecretUse};
use crate::envelope;
use crate::errors::Result;

/// Execute the `seal` command.
pub fn execute(input: Option<&str>, secret: &SecretArgs) -> Result<()> {
    let settings = load_settings()?;
    let key = resolve_secret(secret, &settings, SecretUse::Seal)?;
    let plaintext = Zeroizing::new(read_input(input, "plaintext")?);

    let sealed = envelope::seal(plaintext.as_bytes(), &key)?;
    println!("{}", display_hex(&sealed, &settings));

    Ok(())
}
