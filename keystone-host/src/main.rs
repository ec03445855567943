//! Keystone host binary.
//!
//! Loads `keystone.toml`, starts every bundled module and waits for Ctrl-C.
//!
//! Usage:
//!   keystone-host --config keystone.toml
//!   keystone-host --once        # bootstrap, print the plugin table, exit

use anyhow::{Context, Result};
use clap::Parser;
use keystone_events::CancellationToken;
use keystone_host::{bootstrap, config::DEFAULT_CONFIG_FILE, default_catalog, telemetry, HostConfig, LoggingConfig};
use std::path::PathBuf;
use tracing::info;

#[derive(Parser, Debug)]
#[command(name = "keystone-host")]
#[command(about = "Keystone pluggable application host")]
struct Args {
    /// Path to the host config file
    #[arg(short, long, default_value = DEFAULT_CONFIG_FILE)]
    config: PathBuf,

    /// Enable verbose debug logging
    #[arg(short, long)]
    verbose: bool,

    /// Exit after bootstrap instead of waiting for Ctrl-C
    #[arg(long)]
    once: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let loaded = HostConfig::load(&args.config);
    let level = loaded
        .as_ref()
        .map(|c| c.logging.level.clone())
        .unwrap_or_else(|_| LoggingConfig::default().level);
    telemetry::init(args.verbose, &level)?;
    let config = HostConfig::or_default(&args.config, loaded);

    info!("Keystone host starting...");
    let cancel = CancellationToken::new();
    let host = bootstrap(config, &default_catalog(), cancel.clone())
        .await
        .context("host bootstrap failed")?;

    println!("\n========================================");
    println!("  Keystone Host Running");
    println!("========================================");
    for plugin in host.plugins() {
        println!(
            "  {:<10} {:<8} {:<8} {}",
            plugin.name,
            plugin.version,
            if plugin.enabled { "enabled" } else { "disabled" },
            plugin.state
        );
    }
    if let Some(report) = &host.seeding {
        println!(
            "\n  Seeding: {} schema(s), {} seed(s){}",
            report.schemas_created.len(),
            report.seeded.len(),
            if report.gated { " (gated)" } else { "" }
        );
    }
    println!("========================================\n");

    if args.once {
        info!("Bootstrap complete, exiting (--once)");
        return Ok(());
    }

    tokio::signal::ctrl_c()
        .await
        .context("failed to listen for Ctrl-C")?;
    info!("Shutting down");
    cancel.cancel();
    Ok(())
}
