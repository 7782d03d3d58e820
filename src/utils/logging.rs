//! Structured logging setup.
//!
//! `RUST_LOG` wins when set, so a one-off `RUST_LOG=mhux_client=trace` run
//! works without touching configuration.

use tracing_subscriber::EnvFilter;

use crate::config::LoggingConfig;

/// Initialize the global tracing subscriber.
///
/// Call once, early in the binary; subsequent calls are ignored rather than
/// panicking so tests can init freely.
pub fn init(config: &LoggingConfig) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(config.level.to_string()));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}
