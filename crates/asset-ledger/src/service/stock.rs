//! # Stock Reconciliation
//!
//! `set`, `adjust` and `sync` all end in the same place: a target size for
//! the group's fungible pool. The pool is grown with blank admin units or
//! shrunk by permanently removing safe units, and the new declared level is
//! recorded in the group summary, all in one batch.
//!
//! The batch is guarded on the summary version that was read, so two stock
//! operations on one group never interleave. Every removed unit is guarded
//! on its exact bytes; if any of them changed, nothing is removed.

use super::*;
use crate::domain::asset::{AcquisitionMethod, AddedBy, OwnerRef, Ownership, SourceInfo};
use crate::domain::errors::UnitHolder;
use crate::domain::ledger::{OwnershipSnapshot, PendingEntry};
use crate::domain::reconciliation::{plan_sync, pool_target_for_level, distinguished_stock_count};
use crate::domain::summary::{AggregateSummary, StockOperationKind};
use crate::domain::validation;
use shared_types::{AssetId, GroupKey, OwnerType, Timestamp, TransferType, UserId};
use std::collections::HashMap;
use tracing::info;

/// How the caller expressed the new stock.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum StockChange {
    /// Declare the admin-held level.
    Set(u64),
    /// Move the declared level by a signed amount.
    Adjust(i64),
    /// Size the unserialized pool directly.
    Sync(u64),
}

impl StockChange {
    fn kind(self) -> StockOperationKind {
        match self {
            StockChange::Set(_) => StockOperationKind::Set,
            StockChange::Adjust(_) => StockOperationKind::Adjust,
            StockChange::Sync(_) => StockOperationKind::Sync,
        }
    }

    /// Pool size this change asks for, given the group's units and the
    /// currently declared level.
    fn pool_target(self, units: &[AssetRecord], declared: u64) -> Result<u64, LedgerError> {
        match self {
            StockChange::Set(level) => pool_target_for_level(units, level),
            StockChange::Adjust(delta) => {
                let level = declared
                    .checked_add_signed(delta)
                    .ok_or_else(|| {
                        LedgerError::validation(
                            "delta",
                            format!("adjusting {} by {} leaves negative stock", declared, delta),
                        )
                    })?;
                pool_target_for_level(units, level)
            }
            StockChange::Sync(target) => Ok(target),
        }
    }
}

/// Outcome of one committed stock operation.
struct StockCommit {
    previous: u64,
    new: u64,
    created: Vec<AssetId>,
    removed: Vec<AssetId>,
}

impl<KV, TS, CAT> AssetLedgerService<KV, TS, CAT>
where
    KV: KeyValueStore + 'static,
    TS: TimeSource + 'static,
    CAT: StatusCatalog,
{
    pub(crate) fn change_stock(
        &self,
        group: &GroupKey,
        change: StockChange,
        reason: &str,
        admin: &UserId,
    ) -> Result<AggregateSummary, LedgerError> {
        let group = self.checked_group(group)?;
        let reason = validation::required_text("reason", reason)?;
        validation::required_text("performedBy", admin.as_str())?;

        let commit = self.with_retries("stock_change", || {
            let loaded_units = self.store.group_units(&group)?;
            let units: Vec<AssetRecord> = loaded_units.iter().map(|l| l.value.clone()).collect();
            let stored = self.store.summary(&group)?;
            let declared = stored
                .as_ref()
                .map_or(0, |s| s.value.admin_defined_stock());

            let target = change.pool_target(&units, declared)?;
            let plan = plan_sync(&group, &units, target, |unit| {
                self.catalog
                    .is_disposable(&unit.status_id, &unit.condition_id)
            })?;
            if plan.to_create > self.config.max_stock_batch {
                return Err(LedgerError::validation(
                    "stock",
                    format!(
                        "growing the pool from {} to {} creates more than {} units at once",
                        plan.current, plan.target, self.config.max_stock_batch
                    ),
                ));
            }
            let level = distinguished_stock_count(&units) + plan.target;

            let now = self.time_source.now();
            let mut batch = WriteBatch::new(self.store.ledger_head()?);

            let mut created = Vec::with_capacity(plan.to_create as usize);
            for _ in 0..plan.to_create {
                let unit = self.blank_stock_unit(&group, admin, now);
                batch.insert_asset(&unit)?;
                batch.append(
                    PendingEntry::for_record(
                        &unit,
                        TransferType::AdminAdd,
                        OwnershipSnapshot::new_item(),
                        unit.owner().into(),
                        now,
                    )
                    .processed_by(Some(admin.clone()))
                    .reason(Some(reason.clone())),
                )?;
                created.push(unit.id);
            }

            let by_id: HashMap<AssetId, &Loaded<AssetRecord>> =
                loaded_units.iter().map(|l| (l.value.id, l)).collect();
            let mut removed = Vec::with_capacity(plan.to_remove.len());
            for unit in &plan.to_remove {
                let Some(loaded) = by_id.get(&unit.id) else {
                    return Ok(None);
                };
                batch.append(
                    PendingEntry::for_record(
                        unit,
                        TransferType::OwnershipChange,
                        unit.owner().into(),
                        OwnershipSnapshot::removed(),
                        now,
                    )
                    .processed_by(Some(admin.clone()))
                    .reason(Some(reason.clone())),
                )?;
                batch.remove_asset(loaded);
                self.release_reservations(
                    &mut batch,
                    unit.serial_number.as_deref(),
                    unit.phone_number.as_deref(),
                    UnitHolder::Live(unit.id),
                )?;
                removed.push(unit.id);
            }

            let mut summary = match &stored {
                Some(stored) => stored.value.clone(),
                None => AggregateSummary::empty(group.clone()),
            };
            summary.record_stock_change(
                change.kind(),
                level,
                reason.clone(),
                Some(admin.clone()),
                now,
            );
            batch.put_summary(stored.as_ref(), &summary)?;

            Ok(self.store.commit(batch)?.then_some(StockCommit {
                previous: declared,
                new: level,
                created,
                removed,
            }))
        })?;

        info!(
            %group,
            previous = commit.previous,
            new = commit.new,
            created = commit.created.len(),
            removed = commit.removed.len(),
            performed_by = %admin,
            "Stock level changed"
        );
        self.announce(vec![LedgerEvent::StockLevelChanged {
            group: group.clone(),
            previous: commit.previous,
            new: commit.new,
            created: commit.created,
            removed: commit.removed,
        }]);
        self.current_summary(&group)
    }

    fn blank_stock_unit(&self, group: &GroupKey, admin: &UserId, now: Timestamp) -> AssetRecord {
        AssetRecord {
            id: AssetId::new(),
            item_name: group.item_name.clone(),
            category_id: group.category_id.clone(),
            serial_number: None,
            phone_number: None,
            status_id: self.catalog.default_status(),
            condition_id: self.catalog.default_condition(),
            ownership: Ownership::new(OwnerRef::admin_stock(), now, None),
            source_info: SourceInfo {
                added_by: AddedBy::Admin,
                added_by_user_id: Some(admin.clone()),
                date_added: now,
                initial_owner_type: OwnerType::AdminStock,
                acquisition_method: AcquisitionMethod::StockSync,
                notes: None,
            },
            transfer_info: None,
        }
    }
}
