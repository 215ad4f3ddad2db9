//! # Summary Projection
//!
//! Pure recompute of an [`AggregateSummary`] from a group's live units.
//!
//! Counts are always rebuilt from scratch. Only two things carry over from
//! the previously stored summary: the administrator's declared stock and
//! its operations history.
//!
//! ## Stock auto-detection
//!
//! With [`RecomputeMode::AutoDetect`], if the declared stock differs from
//! the number of admin-sourced units currently in stock, the declaration
//! is corrected and an `auto_correct` operation is logged. A second
//! recompute then finds nothing to correct, so output is stable.

use crate::domain::asset::{AddedBy, AssetRecord};
use crate::domain::summary::{AggregateSummary, StockOperationKind};
use shared_types::{GroupKey, OwnerType, Timestamp};

/// Whether a recompute may correct the declared stock.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecomputeMode {
    /// Align the declared stock with the units actually present.
    AutoDetect,
    /// Keep the declared stock as recorded (used right after a restore).
    TrustRecorded,
}

/// Rebuild the summary for `group` from `units`.
///
/// `units` must be exactly the group's live units; order does not matter.
#[must_use]
pub fn project(
    group: &GroupKey,
    units: &[AssetRecord],
    previous: Option<&AggregateSummary>,
    mode: RecomputeMode,
    now: Timestamp,
) -> AggregateSummary {
    let mut summary = AggregateSummary::empty(group.clone());
    if let Some(previous) = previous {
        summary.stock_management.admin_defined_stock =
            previous.stock_management.admin_defined_stock;
        summary.operations_history = previous.operations_history.clone();
    }

    let mut admin_units = 0u64;
    for unit in units {
        summary.total_quantity += 1;
        match unit.owner().owner_type() {
            OwnerType::AdminStock => summary.available_quantity += 1,
            OwnerType::UserOwned => summary.user_owned_quantity += 1,
        }
        *summary
            .status_breakdown
            .entry(unit.status_id.clone())
            .or_insert(0) += 1;
        *summary
            .condition_breakdown
            .entry(unit.condition_id.clone())
            .or_insert(0) += 1;

        match (unit.source_info.added_by, unit.owner().owner_type()) {
            (AddedBy::User, _) => summary.stock_management.user_contributed_count += 1,
            (AddedBy::Admin, OwnerType::UserOwned) => {
                summary.stock_management.currently_allocated += 1
            }
            (AddedBy::Admin, OwnerType::AdminStock) => admin_units += 1,
        }
    }

    if mode == RecomputeMode::AutoDetect && summary.admin_defined_stock() != admin_units {
        let reason = format!(
            "auto-detected {} admin stock unit(s), declared {}",
            admin_units,
            summary.admin_defined_stock()
        );
        summary.record_stock_change(StockOperationKind::AutoCorrect, admin_units, reason, None, now);
    }
    summary.stock_management.refresh_real_available();
    summary
}
