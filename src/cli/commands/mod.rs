//! One module per subcommand; each exposes an `execute` function.

pub mod completions;
pub mod derive;
pub mod hex;
pub mod key;
pub mod open;
pub mod seal;
pub mod version;
