pub mod cli;
pub mod config;
pub mod crypto;
pub mod encoding;
pub mod envelope;
pub mod errors;
pub mod keystore;
pub mod logging;
