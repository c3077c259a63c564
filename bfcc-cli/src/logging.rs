//! Log setup for the CLI.

use std::io;
use tracing_subscriber::{fmt, EnvFilter};

/// Initialize logging to stderr.
///
/// `RUST_LOG` overrides the default filter, which only lets warnings
/// through so program output stays clean.
pub fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));

    fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(false)
        .init();
}
