//! # Stock Reconciliation
//!
//! Plans how the pool of fungible stock units must change to meet a target.
//!
//! The pool is every administrator-sourced, admin-held unit of the group
//! that has neither a serial nor a phone number. Distinguished units are
//! never created or removed by a sync. A shrink may only remove units the catalog marks as safely
//! disposable, and fails as a whole if there are not enough of them.

use crate::domain::asset::AssetRecord;
use crate::domain::errors::LedgerError;
use shared_types::GroupKey;

/// What a sync has to do.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncPlan {
    /// Pool size before the sync.
    pub current: u64,
    /// Pool size after the sync.
    pub target: u64,
    /// Blank units to create.
    pub to_create: u64,
    /// Units to remove permanently, newest first.
    pub to_remove: Vec<AssetRecord>,
}

impl SyncPlan {
    #[must_use]
    pub fn is_noop(&self) -> bool {
        self.to_create == 0 && self.to_remove.is_empty()
    }
}

/// Admin-sourced, admin-held units that carry a serial or phone number.
#[must_use]
pub fn distinguished_stock_count(units: &[AssetRecord]) -> u64 {
    units
        .iter()
        .filter(|u| u.is_admin_stock_unit() && u.is_distinguished())
        .count() as u64
}

/// Pool target that makes the declared stock equal `level`.
///
/// Distinguished stock counts towards the level but is untouchable, so the
/// level may not go below it.
pub fn pool_target_for_level(units: &[AssetRecord], level: u64) -> Result<u64, LedgerError> {
    let distinguished = distinguished_stock_count(units);
    level.checked_sub(distinguished).ok_or_else(|| {
        LedgerError::validation(
            "stock",
            format!(
                "stock level {} is below the {} serialized or numbered unit(s) in stock",
                level, distinguished
            ),
        )
    })
}

/// Plan a sync of `group`'s pool to `target` units.
///
/// `is_safe` decides whether a pool unit may be removed.
pub fn plan_sync<F>(
    group: &GroupKey,
    units: &[AssetRecord],
    target: u64,
    is_safe: F,
) -> Result<SyncPlan, LedgerError>
where
    F: Fn(&AssetRecord) -> bool,
{
    let pool: Vec<&AssetRecord> = units.iter().filter(|u| u.is_sync_pool_unit()).collect();
    let current = pool.len() as u64;

    if target >= current {
        return Ok(SyncPlan {
            current,
            target,
            to_create: target - current,
            to_remove: Vec::new(),
        });
    }

    let required = current - target;
    let mut safe: Vec<&AssetRecord> = pool.into_iter().filter(|u| is_safe(*u)).collect();
    if (safe.len() as u64) < required {
        return Err(LedgerError::InsufficientSafeUnits {
            group: group.clone(),
            required,
            available: safe.len() as u64,
        });
    }

    safe.sort_by(|a, b| {
        b.source_info
            .date_added
            .cmp(&a.source_info.date_added)
            .then_with(|| b.id.cmp(&a.id))
    });
    let to_remove = safe
        .into_iter()
        .take(required as usize)
        .cloned()
        .collect();

    Ok(SyncPlan {
        current,
        target,
        to_create: 0,
        to_remove,
    })
}
