//! # Ledger Runtime
//!
//! ## Startup Sequence
//!
//! 1. Rebuild every group summary (repairs anything a crash left stale)
//! 2. Start the audit log subscriber
//! 3. Start the retention purge task
//!
//! ## Shutdown Sequence
//!
//! 1. Signal shutdown to all tasks
//! 2. Wait for them to finish (bounded)
//! 3. Drop the container, releasing the data directory lock

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use asset_ledger::{AssetLedgerApi, KeyValueStore, TimeSource};
use parking_lot::Mutex;
use shared_bus::{EventFilter, EventTopic};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{error, info, warn};

use crate::container::LedgerContainer;
use crate::tasks::{run_audit_log, run_purge_loop};

/// How long shutdown waits for background tasks.
const SHUTDOWN_GRACE: Duration = Duration::from_secs(5);

/// The runtime orchestrating the ledger and its background tasks.
pub struct LedgerRuntime<KV, TS>
where
    KV: KeyValueStore + 'static,
    TS: TimeSource + 'static,
{
    container: Arc<LedgerContainer<KV, TS>>,
    shutdown_tx: watch::Sender<bool>,
    shutdown_rx: watch::Receiver<bool>,
    tasks: Mutex<Vec<JoinHandle<()>>>,
}

impl<KV, TS> LedgerRuntime<KV, TS>
where
    KV: KeyValueStore + 'static,
    TS: TimeSource + 'static,
{
    pub fn new(container: LedgerContainer<KV, TS>) -> Self {
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        Self {
            container: Arc::new(container),
            shutdown_tx,
            shutdown_rx,
            tasks: Mutex::new(Vec::new()),
        }
    }

    /// Run the startup sequence and spawn the background tasks.
    pub async fn start(&self) -> Result<()> {
        info!("===========================================");
        info!("  Asset Ledger Runtime v{}", env!("CARGO_PKG_VERSION"));
        info!("===========================================");

        let ledger = Arc::clone(&self.container.ledger);
        let groups = tokio::task::spawn_blocking(move || ledger.recompute_all())
            .await
            .context("Summary rebuild task failed")?
            .context("Failed to rebuild group summaries")?;
        info!(groups, "Group summaries rebuilt");

        let audit = tokio::spawn({
            let subscription = self.container.event_bus.subscribe(EventFilter::all());
            let shutdown = self.shutdown_rx.clone();
            async move {
                let logged = run_audit_log(subscription, shutdown).await;
                info!(logged, "Audit log stopped");
            }
        });

        let purge = tokio::spawn({
            let ledger = Arc::clone(&self.container.ledger);
            let interval = self.container.config.purge_interval();
            let shutdown = self.shutdown_rx.clone();
            async move {
                run_purge_loop(ledger, interval, shutdown).await;
            }
        });

        self.tasks.lock().extend([audit, purge]);
        info!(
            data_dir = %self.container.config.data_dir.display(),
            purge_interval_secs = self.container.config.purge_interval_secs,
            "Background tasks started"
        );
        Ok(())
    }

    /// Stop the background tasks.
    pub async fn shutdown(&self) {
        info!("Initiating graceful shutdown...");

        if let Err(e) = self.shutdown_tx.send(true) {
            error!("Failed to send shutdown signal: {}", e);
        }

        let tasks: Vec<_> = self.tasks.lock().drain(..).collect();
        for task in tasks {
            match tokio::time::timeout(SHUTDOWN_GRACE, task).await {
                Ok(Ok(())) => {}
                Ok(Err(e)) => warn!(error = %e, "Background task ended abnormally"),
                Err(_) => warn!("Background task did not stop in time"),
            }
        }

        let bus = &self.container.event_bus;
        info!(
            units = bus.published_on(EventTopic::Units),
            archive = bus.published_on(EventTopic::Archive),
            stock = bus.published_on(EventTopic::Stock),
            total = bus.published_on(EventTopic::All),
            "Shutdown complete"
        );
    }

    pub fn container(&self) -> Arc<LedgerContainer<KV, TS>> {
        Arc::clone(&self.container)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::container::RuntimeConfig;
    use asset_ledger::test_utils::MockTimeSource;
    use asset_ledger::{DeleteRequest, NewUnit};
    use shared_types::SECONDS_PER_DAY;

    #[tokio::test]
    async fn test_start_purge_and_shutdown() {
        let clock = MockTimeSource::default();
        let config = RuntimeConfig {
            purge_interval_secs: 1,
            ..RuntimeConfig::default()
        };
        let runtime = LedgerRuntime::new(LedgerContainer::in_memory(config, clock.clone()));
        let ledger = Arc::clone(&runtime.container().ledger);

        let unit = ledger
            .create_unit(NewUnit::admin_stock("Mouse", "accessories"))
            .unwrap();
        ledger
            .delete_unit(unit.id, DeleteRequest::individual("damaged", "A1", "Admin One"))
            .unwrap();
        clock.advance(30 * SECONDS_PER_DAY + 1);

        runtime.start().await.unwrap();
        for _ in 0..100 {
            if ledger.list_archive().unwrap().is_empty() {
                break;
            }
            tokio::time::sleep(Duration::from_millis(20)).await;
        }
        runtime.shutdown().await;

        assert!(ledger.list_archive().unwrap().is_empty());
        assert!(runtime.tasks.lock().is_empty());
        let bus = &runtime.container().event_bus;
        assert_eq!(bus.published_on(EventTopic::Archive), 2);
    }
}
