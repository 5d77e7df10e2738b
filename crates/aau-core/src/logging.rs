//! Structured logging with `tracing`.
//!
//! Everything in the aau crates logs through `tracing` macros. Nothing is
//! printed unless a subscriber is installed with a level other than `off`,
//! which the binary does only when `AAU_DEBUG` (or `RUST_LOG`) asks for it.

use tracing_subscriber::EnvFilter;

/// Install the stderr subscriber if logging was asked for.
///
/// `level` comes from [`DebugFlags::log_level`](crate::DebugFlags::log_level)
/// and is `off` unless `AAU_DEBUG` is set. A `RUST_LOG` filter replaces it.
/// With neither, no subscriber is installed and events are dropped.
///
/// Stdout is never written: during environment activation it belongs to the
/// shell. Later calls keep the first subscriber.
pub fn init_subscriber(level: &str) {
    let filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) if level == "off" => return,
        Err(_) => EnvFilter::new(level),
    };

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .compact()
        .try_init();
}
