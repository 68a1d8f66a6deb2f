//! `gcmseal version` — display version and enabled features.

use console::style;

use crate::errors::Result;

/// Execute the `version` command.
pub fn execute() -> Result<()> {
    println!("gcmseal {}", env!("CARGO_PKG_VERSION"));

    let keyring = if cfg!(feature = "keyring-store") {
        style("enabled").green()
    } else {
        style("disabled").dim()
    };
    println!("  keyring-store: {keyring}");

    Ok(())
}
