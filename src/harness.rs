//! Test harness helpers

use tracing_subscriber::EnvFilter;

/// Install a test-friendly `tracing` subscriber honoring `RUST_LOG`.
/// Safe to call from every test; only the first call installs.
pub fn init_test_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("velocity_guard=debug")),
        )
        .with_test_writer()
        .try_init();
}
