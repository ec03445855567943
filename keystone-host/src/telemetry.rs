//! Tracing subscriber setup for the host binary.

use tracing_subscriber::{EnvFilter, FmtSubscriber};

/// Builds the filter: `RUST_LOG` wins, then `--verbose`, then the config level.
pub fn env_filter(verbose: bool, level: &str) -> EnvFilter {
    let fallback = if verbose { "debug" } else { level };
    EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(fallback))
        .unwrap_or_else(|_| EnvFilter::new("info"))
}

/// Installs the global subscriber. Call once, from `main`.
pub fn init(verbose: bool, level: &str) -> anyhow::Result<()> {
    FmtSubscriber::builder()
        .with_env_filter(env_filter(verbose, level))
        .with_target(false)
        .compact()
        .try_init()
        .map_err(|e| anyhow::anyhow!("failed to install tracing subscriber: {e}"))
}
