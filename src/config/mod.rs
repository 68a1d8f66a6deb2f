//! Project configuration loaded from `.gcmseal.toml`.

pub mod settings;

pub use settings::{KeyStoreBackend, Settings};
