//! # Audit Log Subscriber
//!
//! Writes every bus event to the `audit` tracing target, so an operator has
//! a chronological record of ledger activity next to the ledger itself.

use shared_bus::{InventoryEvent, Subscription};
use tokio::sync::watch;
use tracing::info;

/// Log events from `subscription` until shutdown or until the bus closes.
/// Returns how many events were logged.
///
/// Pending events are drained before a shutdown is honoured.
pub async fn run_audit_log(
    mut subscription: Subscription,
    mut shutdown: watch::Receiver<bool>,
) -> u64 {
    let mut logged = 0;
    loop {
        tokio::select! {
            biased;
            event = subscription.recv() => match event {
                Some(event) => {
                    record(&event);
                    logged += 1;
                }
                None => return logged,
            },
            changed = shutdown.changed() => {
                if changed.is_err() || *shutdown.borrow() {
                    return logged;
                }
            }
        }
    }
}

fn record(event: &InventoryEvent) {
    match event {
        InventoryEvent::UnitCreated {
            asset_id,
            group,
            owner_type,
            transfer_type,
        } => info!(
            target: "audit",
            %asset_id, %group, %owner_type, %transfer_type,
            "unit created"
        ),
        InventoryEvent::UnitTransferred {
            asset_id,
            from_owner,
            from_user,
            to_owner,
            to_user,
            transfer_type,
            ..
        } => info!(
            target: "audit",
            %asset_id, %from_owner, ?from_user, %to_owner, ?to_user, %transfer_type,
            "unit transferred"
        ),
        InventoryEvent::UnitStatusChanged {
            asset_id,
            from_status,
            to_status,
            ..
        } => info!(target: "audit", %asset_id, %from_status, %to_status, "unit status changed"),
        InventoryEvent::UnitArchived {
            archive_id,
            asset_id,
            delete_type,
            ..
        } => info!(target: "audit", %archive_id, %asset_id, %delete_type, "unit archived"),
        InventoryEvent::UnitRestored {
            archive_id,
            asset_id,
            ..
        } => info!(target: "audit", %archive_id, %asset_id, "unit restored"),
        InventoryEvent::ArchivePurged {
            archive_id,
            asset_id,
            ..
        } => info!(target: "audit", %archive_id, %asset_id, "archive record purged"),
        InventoryEvent::UnitsRemoved { group, asset_ids } => {
            info!(target: "audit", %group, removed = asset_ids.len(), "stock units removed")
        }
        InventoryEvent::StockLevelChanged {
            group,
            previous,
            new,
        } => info!(target: "audit", %group, previous, new, "stock level changed"),
        InventoryEvent::SummaryRecomputed {
            group,
            total,
            available,
            user_owned,
        } => info!(target: "audit", %group, total, available, user_owned, "summary recomputed"),
    }
}
