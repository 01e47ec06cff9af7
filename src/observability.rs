//! Logging setup
//!
//! Log output goes to stderr so it never mixes with the account CSV on stdout.
//! `RUST_LOG` wins over the configured filter when it is set.

use tracing_subscriber::EnvFilter;

/// Install the global `tracing` subscriber
///
/// Calling this more than once is harmless; later calls leave the first
/// subscriber in place.
pub fn init(default_filter: &str) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}
