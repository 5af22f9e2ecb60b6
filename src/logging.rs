//! Log output setup
//!
//! Logs go to stderr so the output of the external tools on stdout is left
//! alone. `--verbose` forces debug level; otherwise `RUST_LOG` is honoured,
//! falling back to info.

use tracing_subscriber::EnvFilter;

/// Build the log filter for the given verbosity
pub fn build_env_filter(verbose: bool) -> EnvFilter {
    if verbose {
        return EnvFilter::new("debug");
    }

    match std::env::var("RUST_LOG") {
        Ok(filter) => EnvFilter::try_new(filter).unwrap_or_else(|_| EnvFilter::new("info")),
        Err(_) => EnvFilter::new("info"),
    }
}

/// Install the global subscriber; a second call is a no-op
pub fn init(verbose: bool) {
    let result = tracing_subscriber::fmt()
        .with_env_filter(build_env_filter(verbose))
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();

    // Only fails when a subscriber is already installed, which then keeps logging.
    if let Err(err) = result {
        tracing::debug!("Log subscriber already installed: {}", err);
    }
}
