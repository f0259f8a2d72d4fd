//! Tracing setup for the `brotest` binary.
//!
//! The library only emits events under the `brotest` target; installing a
//! subscriber is left to whoever owns the process.

use tracing_subscriber::{fmt, EnvFilter};

/// Installs a stderr subscriber. `RUST_LOG` wins over `level` when set.
///
/// Calling this twice is harmless; the second subscriber is dropped.
pub fn init(level: &str) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("brotest={level},warn")));
    let _ = fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}
