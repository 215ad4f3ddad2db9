//! # Transfers and Status Changes
//!
//! Both read the unit, check the caller's view of it, and write the new
//! record guarded on the exact bytes that were read. A concurrent writer
//! therefore forces a re-read: a transfer that lost the race sees the new
//! owner and fails with `OwnershipMismatch`.

use super::*;
use crate::domain::asset::{Ownership, TransferInfo};
use crate::domain::ledger::{PendingEntry, StatusChange};
use crate::domain::validation;
use crate::ports::inbound::{StatusChangeRequest, TransferRequest};
use shared_types::TransferType;
use tracing::info;

impl<KV, TS, CAT> AssetLedgerService<KV, TS, CAT>
where
    KV: KeyValueStore + 'static,
    TS: TimeSource + 'static,
    CAT: StatusCatalog,
{
    pub(crate) fn commit_transfer(
        &self,
        request: TransferRequest,
    ) -> Result<AssetRecord, LedgerError> {
        if request.transfer_type == TransferType::StatusChange {
            return Err(LedgerError::validation(
                "transferType",
                "status_change entries are written by status changes, not transfers",
            ));
        }
        if request.expected_from == request.to {
            return Err(LedgerError::validation(
                "toOwnership",
                format!("unit would stay with {}", request.to),
            ));
        }
        if request.processed_by.as_str().trim().is_empty() {
            return Err(LedgerError::validation("processedBy", "must not be empty"));
        }
        let mut context = request.context.clone();
        context.reason = validation::optional_text(context.reason.as_deref());
        let approved_by = context
            .approved_by
            .clone()
            .unwrap_or_else(|| request.processed_by.clone());

        let (previous, record) = self.with_retries("transfer_unit", || {
            let loaded = self.store.require_asset(&request.asset_id)?;
            let current = loaded.value.owner();
            if current != &request.expected_from {
                return Err(LedgerError::OwnershipMismatch {
                    asset_id: request.asset_id,
                    expected: request.expected_from.clone(),
                    actual: current.clone(),
                });
            }

            let now = self.time_source.now();
            let mut next = loaded.value.clone();
            next.ownership = Ownership::new(request.to.clone(), now, Some(approved_by.clone()));
            next.transfer_info = Some(TransferInfo {
                transferred_from: current.clone(),
                transfer_date: now,
                approved_by: approved_by.clone(),
                request_id: context.request_id.clone(),
                return_id: context.return_id.clone(),
            });

            let mut batch = WriteBatch::new(self.store.ledger_head()?);
            batch.replace_asset(&loaded, &next)?;
            batch.append(
                PendingEntry::for_record(
                    &next,
                    request.transfer_type,
                    current.into(),
                    next.owner().into(),
                    now,
                )
                .processed_by(Some(request.processed_by.clone()))
                .context(&context),
            )?;

            let previous = current.clone();
            Ok(self.store.commit(batch)?.then_some((previous, next)))
        })?;

        info!(
            asset_id = %record.id,
            from = %previous,
            to = %record.owner(),
            transfer_type = %request.transfer_type,
            "Unit transferred"
        );
        self.announce(vec![LedgerEvent::UnitTransferred {
            asset_id: record.id,
            group: record.group(),
            from: previous,
            to: record.owner().clone(),
            transfer_type: request.transfer_type,
        }]);
        Ok(record)
    }

    pub(crate) fn commit_status_change(
        &self,
        request: StatusChangeRequest,
    ) -> Result<AssetRecord, LedgerError> {
        self.require_status(&request.new_status_id)?;
        if let Some(condition) = &request.new_condition_id {
            self.require_condition(condition)?;
        }
        if request.changed_by.as_str().trim().is_empty() {
            return Err(LedgerError::validation("changedBy", "must not be empty"));
        }
        let reason = validation::optional_text(request.reason.as_deref());

        let (change, record) = self.with_retries("change_status", || {
            let loaded = self.store.require_asset(&request.asset_id)?;
            let change = StatusChange {
                from_status: loaded.value.status_id.clone(),
                to_status: request.new_status_id.clone(),
                from_condition: loaded.value.condition_id.clone(),
                to_condition: request
                    .new_condition_id
                    .clone()
                    .unwrap_or_else(|| loaded.value.condition_id.clone()),
            };
            if change.from_status == change.to_status
                && change.from_condition == change.to_condition
            {
                return Ok(Some((None, loaded.value)));
            }

            let now = self.time_source.now();
            let mut next = loaded.value.clone();
            next.status_id = change.to_status.clone();
            next.condition_id = change.to_condition.clone();

            let owner = next.owner();
            let mut batch = WriteBatch::new(self.store.ledger_head()?);
            batch.replace_asset(&loaded, &next)?;
            batch.append(
                PendingEntry::for_record(
                    &next,
                    TransferType::StatusChange,
                    owner.into(),
                    owner.into(),
                    now,
                )
                .processed_by(Some(request.changed_by.clone()))
                .reason(reason.clone())
                .status_change(change.clone()),
            )?;

            Ok(self.store.commit(batch)?.then_some((Some(change), next)))
        })?;

        let Some(change) = change else {
            return Ok(record);
        };
        info!(
            asset_id = %record.id,
            from_status = %change.from_status,
            to_status = %change.to_status,
            from_condition = %change.from_condition,
            to_condition = %change.to_condition,
            "Unit status changed"
        );
        self.announce(vec![LedgerEvent::UnitStatusChanged {
            asset_id: record.id,
            group: record.group(),
            from_status: change.from_status,
            to_status: change.to_status,
        }]);
        Ok(record)
    }
}
