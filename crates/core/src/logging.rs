//! Console logging setup.
//!
//! Library code only emits `tracing` events. Binaries and demos call
//! [`init_logging`] once to print them.

use tracing_subscriber::EnvFilter;

use crate::config::LoggingConfig;

/// Install a `fmt` subscriber.
///
/// `RUST_LOG` wins over the configured level when set. Returns `false` if a
/// global subscriber was already installed.
pub fn init_logging(config: &LoggingConfig) -> bool {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(config.level.to_ascii_lowercase()));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .try_init()
        .is_ok()
}
