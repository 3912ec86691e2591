//! Diagnostic logging setup.
//!
//! Diagnostics go to stderr through `tracing`, leaving stdout for reports so
//! `cophotographer analyze photo.jpg > report.txt` stays clean. The level
//! defaults to `info`; `RUST_LOG` overrides it (`RUST_LOG=cophotographer=debug`).

use tracing_subscriber::prelude::*;
use tracing_subscriber::{EnvFilter, fmt};

const DEFAULT_FILTER: &str = "info";

/// Build the filter from `RUST_LOG`, falling back to [`DEFAULT_FILTER`].
pub fn env_filter() -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER))
}

/// Install the global subscriber. Call once, at startup.
pub fn init() {
    let fmt_layer = fmt::layer()
        .with_target(false)
        .with_timer(fmt::time::uptime())
        .with_writer(std::io::stderr);

    tracing_subscriber::registry()
        .with(env_filter())
        .with(fmt_layer)
        .init();
}
