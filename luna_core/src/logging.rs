//! Tracing setup shared by every Luna front end.

use tracing_subscriber::EnvFilter;

/// Initialize logging at the default `info` level.
///
/// `RUST_LOG` overrides the default when set.
pub fn init() {
    init_with_level("info")
}

/// Initialize logging with a specific fallback level (debug, info, warn,
/// error) for when `RUST_LOG` is not set.
pub fn init_with_level(default_level: &str) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .compact()
        .init();
}
