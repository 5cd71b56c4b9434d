//! Logging setup on top of `tracing-subscriber`.

use tracing_subscriber::{EnvFilter, fmt};

/// Initialize logging for the command-line tool.
///
/// `RUST_LOG` selects the filter (default `info`, e.g. `RUST_LOG=prun_planner=debug`).
/// Output goes to stderr so `plan --json` stays machine readable.
pub fn init() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_line_number(true)
        .with_writer(std::io::stderr)
        .init();
}

/// Verbose logging for tests; safe to call more than once.
pub fn init_test() {
    let _ = fmt()
        .with_env_filter(EnvFilter::new("debug"))
        .with_test_writer()
        .try_init();
}
