//! Logging init: stderr subscriber controlled by RUST_LOG.

use tracing_subscriber::EnvFilter;

/// Initialize tracing output to stderr. Diagnostics go here; the
/// human-readable progress lines are printed to stdout by the CLI layer.
pub fn init() {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info,sdi_core=debug"));
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .with_ansi(false)
        .init();
}
