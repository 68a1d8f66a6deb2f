//! Diagnostic logging setup.
//!
//! Library code emits `tracing` events; only the binary installs a
//! subscriber. Events never carry key bytes or plaintext.

use tracing_subscriber::EnvFilter;

/// Environment variable holding the log filter (e.g. `gcmseal=debug`).
pub const LOG_ENV: &str = "GCMSEAL_LOG";

/// Filter used when `GCMSEAL_LOG` is unset or invalid.
const DEFAULT_FILTER: &str = "warn";

/// Install a stderr `fmt` subscriber. Safe to call more than once; later
/// calls are no-ops.
pub fn init() {
    let filter =
        EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}
