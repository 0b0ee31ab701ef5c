//! Development-time tracing.
//!
//! Diagnostics only: stage spawns, timeouts and cleanup failures go to
//! stderr through `tracing`. Nothing here is part of an [`ExecutionResult`].
//!
//! [`ExecutionResult`]: crate::ExecutionResult

use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Initialize the tracing subscriber.
///
/// Reads `RUST_LOG`; falls back to `default_filter` (e.g. `"warn"`) when unset.
/// Output: stderr, compact format.
///
/// # Example
/// ```bash
/// RUST_LOG=goforit_engine=debug goforit --no-browser
/// ```
pub fn init(default_filter: &str) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(std::io::stderr).compact())
        .init();
}
