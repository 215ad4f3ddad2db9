//! # Retention Purge Task
//!
//! Calls `purge_expired` on a fixed interval. The ledger call is blocking,
//! so each sweep runs on the blocking pool.

use asset_ledger::{AssetLedgerApi, LedgerError};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tracing::{debug, info, warn};

/// Run one sweep. Returns how many archive records were destroyed.
pub async fn sweep_once<L>(ledger: Arc<L>) -> Result<usize, LedgerError>
where
    L: AssetLedgerApi + Send + Sync + 'static,
{
    tokio::task::spawn_blocking(move || ledger.purge_expired())
        .await
        .map_err(|e| LedgerError::Persistence {
            message: format!("purge sweep panicked: {}", e),
        })?
}

/// Sweep every `interval` until shutdown. Returns the total purged.
///
/// A failed sweep is logged and retried at the next tick.
pub async fn run_purge_loop<L>(
    ledger: Arc<L>,
    interval: Duration,
    mut shutdown: watch::Receiver<bool>,
) -> usize
where
    L: AssetLedgerApi + Send + Sync + 'static,
{
    let mut ticker = tokio::time::interval(interval);
    ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
    let mut total = 0;

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                match sweep_once(Arc::clone(&ledger)).await {
                    Ok(0) => debug!("Purge sweep found nothing expired"),
                    Ok(purged) => {
                        total += purged;
                        info!(purged, total, "Purge sweep completed");
                    }
                    Err(e) => warn!(error = %e, "Purge sweep failed"),
                }
            }
            changed = shutdown.changed() => {
                if changed.is_err() || *shutdown.borrow() {
                    info!(total, "Purge task stopping");
                    return total;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use asset_ledger::test_utils::make_test_service;
    use asset_ledger::{DeleteRequest, NewUnit};
    use shared_types::SECONDS_PER_DAY;

    #[tokio::test]
    async fn test_loop_purges_and_stops_on_shutdown() {
        let (ledger, clock) = make_test_service();
        let unit = ledger
            .create_unit(NewUnit::admin_stock("Mouse", "accessories"))
            .unwrap();
        ledger
            .delete_unit(unit.id, DeleteRequest::individual("damaged", "A1", "Admin One"))
            .unwrap();
        clock.advance(30 * SECONDS_PER_DAY + 1);

        let ledger = Arc::new(ledger);
        let (tx, rx) = watch::channel(false);
        let handle = tokio::spawn(run_purge_loop(
            Arc::clone(&ledger),
            Duration::from_millis(10),
            rx,
        ));

        for _ in 0..100 {
            if ledger.list_archive().unwrap().is_empty() {
                break;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        tx.send(true).unwrap();

        assert_eq!(handle.await.unwrap(), 1);
        assert!(ledger.list_archive().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_sweep_leaves_unexpired_records() {
        let (ledger, _) = make_test_service();
        let unit = ledger
            .create_unit(NewUnit::admin_stock("Mouse", "accessories"))
            .unwrap();
        ledger
            .delete_unit(unit.id, DeleteRequest::individual("damaged", "A1", "Admin One"))
            .unwrap();

        let ledger = Arc::new(ledger);
        assert_eq!(sweep_once(Arc::clone(&ledger)).await.unwrap(), 0);
        assert_eq!(ledger.list_archive().unwrap().len(), 1);
    }
}
