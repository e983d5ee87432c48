//! Tracing/logging initialization for the binary.

use tracing_subscriber::EnvFilter;

/// Install the process-wide subscriber. `RUST_LOG` wins when set; otherwise
/// `verbose` picks `debug` over the default `warn`. Logs go to stderr so they
/// never mix with command output.
///
/// Safe to call multiple times (subsequent calls are no-ops).
pub fn init_logging(verbose: bool) {
    let default_level = if verbose { "kassa=debug" } else { "warn" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}
