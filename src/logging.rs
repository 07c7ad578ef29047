//! # Logging
//!
//! Installs the global `tracing` subscriber. `RUST_LOG` takes precedence
//! over the configured filter.

use tracing_subscriber::EnvFilter;

/// Install the subscriber once. Later calls are no-ops, which keeps tests
/// that boot several servers in one process working.
pub fn init(default_filter: &str) {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(default_filter))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .try_init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_init_is_idempotent() {
        init("debug");
        init("not a valid filter ===");
    }
}
