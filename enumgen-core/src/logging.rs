//! Structured logging using **tracing**.
//!
//! Events go to stderr so generated code written to stdout (`--out -`) stays
//! clean. Library code only emits events; installing a subscriber is left to
//! the binary.

use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

/// Default filter when `RUST_LOG` is not set.
const DEFAULT_FILTER: &str = "warn";

/// Initializes the global tracing subscriber with JSON output on stderr.
///
/// Call once at startup. Calling it again is a no-op.
///
/// # Environment Variables
/// - `RUST_LOG`: Controls log filtering (e.g., `RUST_LOG=enumgen_core=debug`)
pub fn init_structured_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));

    let _ = tracing_subscriber::fmt()
        .json()
        .with_ansi(false)
        .with_level(true)
        .with_target(true)
        .with_current_span(true)
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

/// Logs a warning event.
pub fn log_warn(message: &str) {
    warn!(detail = %message);
}

/// Logs an info event.
pub fn log_info(message: &str) {
    info!(detail = %message);
}

/// Logs an error event.
pub fn log_error(message: &str) {
    error!(detail = %message);
}

/// Logs an output-file event (`generated`, `unmodified`, `failed`).
pub fn log_output(event: &str, path: &str) {
    match event {
        "failed" => error!(event = %event, path = %path, "enum output"),
        _ => info!(event = %event, path = %path, "enum output"),
    }
}
