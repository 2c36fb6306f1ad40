//! Logging setup for the server binary.
//!
//! Output always goes to stderr so the stdio transport keeps stdout for
//! protocol frames. Secrets never reach the log stream: header values are
//! not logged anywhere in the client, and the key store only reports
//! source names.

use tracing_subscriber::EnvFilter;

/// Initialize the global subscriber. `RUST_LOG` wins over the verbosity
/// flag when set.
pub fn init(verbose: bool) {
    let default_directive = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directive));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}
