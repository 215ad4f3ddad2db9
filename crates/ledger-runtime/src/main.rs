//! # Asset Ledger Runtime
//!
//! Entry point for the asset ledger process. See the library docs for the
//! wiring; this file only bootstraps logging and waits for Ctrl+C.

use anyhow::{Context, Result};
use tracing::info;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use ledger_runtime::{LedgerContainer, LedgerRuntime, RuntimeConfig};

#[tokio::main]
async fn main() -> Result<()> {
    let config = RuntimeConfig::from_env().context("Invalid configuration")?;

    // Initialize logging
    let filter = EnvFilter::try_new(&config.log_filter)
        .with_context(|| format!("Invalid log filter {:?}", config.log_filter))?;
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_ids(true)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let container = LedgerContainer::open(config).context("Failed to open ledger")?;
    let runtime = LedgerRuntime::new(container);
    runtime.start().await?;

    info!("Ledger is running. Press Ctrl+C to stop.");
    tokio::signal::ctrl_c().await?;

    runtime.shutdown().await;
    Ok(())
}
