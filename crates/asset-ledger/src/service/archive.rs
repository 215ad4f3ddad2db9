//! # Archive Operations
//!
//! Deleting moves a unit into the archive and re-points its serial/phone
//! reservations at the archive record, so the values stay taken until the
//! record is restored or purged.
//!
//! Each archive record remembers the group's declared stock at deletion
//! time, and a restore writes that level back in the same batch.
//!
//! Restore and purge both start by deleting the archive record under a
//! guard on its exact bytes. Whichever commits first wins; the other
//! re-reads, finds nothing, and reports `NotFound` (restore) or skips the
//! record (purge).

use super::helpers::Reserved;
use super::*;
use crate::domain::archive::{ArchiveRecord, DeleteRequest};
use crate::domain::errors::UnitHolder;
use crate::domain::ledger::{OwnershipSnapshot, PendingEntry};
use crate::domain::summary::{AggregateSummary, StockOperationKind};
use crate::domain::validation;
use shared_types::{ArchiveId, AssetId, DeleteType, GroupKey, Timestamp, TransferType, UserId};
use tracing::{info, warn};

/// What happened to one purge candidate.
enum PurgeOutcome {
    Purged(ArchiveRecord),
    /// Restored, purged by someone else, or no longer eligible.
    Skipped,
}

impl<KV, TS, CAT> AssetLedgerService<KV, TS, CAT>
where
    KV: KeyValueStore + 'static,
    TS: TimeSource + 'static,
    CAT: StatusCatalog,
{
    fn check_delete_request(&self, request: DeleteRequest) -> Result<DeleteRequest, LedgerError> {
        let reason = validation::required_text("deleteReason", &request.reason)?;
        let deleted_by = validation::required_text("deletedBy", request.deleted_by.as_str())?;
        let deleted_by_name = validation::optional_text(Some(request.deleted_by_name.as_str()))
            .unwrap_or_else(|| deleted_by.clone());
        Ok(DeleteRequest {
            delete_type: request.delete_type,
            reason,
            deleted_by: UserId::new(deleted_by),
            deleted_by_name,
        })
    }

    fn declared_stock(&self, group: &GroupKey) -> Result<u64, LedgerError> {
        Ok(self
            .store
            .summary(group)?
            .map_or(0, |stored| stored.value.admin_defined_stock()))
    }

    /// Archive `units`, all of `group`, in one batch.
    fn archive_batch(
        &self,
        group: &GroupKey,
        units: &[Loaded<AssetRecord>],
        request: &DeleteRequest,
        now: Timestamp,
    ) -> Result<(WriteBatch, Vec<ArchiveRecord>), LedgerError> {
        let retention = self.config.retention_secs;
        let declared = self.declared_stock(group)?;
        let mut batch = WriteBatch::unsequenced();
        let mut archived = Vec::with_capacity(units.len());

        for loaded in units {
            let record =
                ArchiveRecord::capture(loaded.value.clone(), request, declared, now, retention);
            batch.remove_asset(loaded);
            batch.put_archive(&record)?;
            let holder = UnitHolder::Archived(record.id);
            if let Some(serial) = &record.serial_number {
                batch.hand_over(Reserved::Serial.key(serial), holder)?;
            }
            if let Some(phone) = &record.phone_number {
                batch.hand_over(Reserved::Phone.key(phone), holder)?;
            }
            archived.push(record);
        }
        Ok((batch, archived))
    }

    fn announce_archived(&self, archived: &[ArchiveRecord]) {
        self.announce(
            archived
                .iter()
                .map(|record| LedgerEvent::UnitArchived {
                    archive_id: record.id,
                    asset_id: record.asset_id(),
                    group: record.group(),
                    delete_type: record.delete_type,
                })
                .collect(),
        );
    }

    pub(crate) fn archive_unit(
        &self,
        asset_id: AssetId,
        request: DeleteRequest,
    ) -> Result<ArchiveRecord, LedgerError> {
        let request = self.check_delete_request(request)?;

        let archived = self.with_retries("delete_unit", || {
            let loaded = self.store.require_asset(&asset_id)?;
            let now = self.time_source.now();
            let group = loaded.value.group();
            let (batch, mut archived) =
                self.archive_batch(&group, std::slice::from_ref(&loaded), &request, now)?;
            Ok(self.store.commit(batch)?.then(|| archived.remove(0)))
        })?;

        info!(
            asset_id = %asset_id,
            archive_id = %archived.id,
            deleted_by = %archived.deleted_by,
            reason = %archived.delete_reason,
            "Unit archived"
        );
        self.announce_archived(std::slice::from_ref(&archived));
        Ok(archived)
    }

    pub(crate) fn archive_group(
        &self,
        group: &GroupKey,
        request: DeleteRequest,
    ) -> Result<Vec<ArchiveRecord>, LedgerError> {
        let group = self.checked_group(group)?;
        let request = self.check_delete_request(DeleteRequest {
            delete_type: DeleteType::CategoryBulk,
            ..request
        })?;

        let archived = self.with_retries("delete_group", || {
            let units = self.store.group_units(&group)?;
            if units.is_empty() {
                return Err(LedgerError::not_found("group", &group));
            }
            let (batch, archived) =
                self.archive_batch(&group, &units, &request, self.time_source.now())?;
            Ok(self.store.commit(batch)?.then_some(archived))
        })?;

        info!(
            %group,
            units = archived.len(),
            deleted_by = %request.deleted_by,
            "Group archived"
        );
        self.announce_archived(&archived);
        Ok(archived)
    }

    /// Restore `archive_id`, and for a bulk deletion every restorable record
    /// of the same group deleted in bulk.
    pub(crate) fn restore_archived(
        &self,
        archive_id: ArchiveId,
        restored_by: &UserId,
    ) -> Result<Vec<AssetRecord>, LedgerError> {
        validation::required_text("restoredBy", restored_by.as_str())?;

        let restored = self.with_retries("restore_unit", || {
            let now = self.time_source.now();
            let target = match self.store.archive(&archive_id)? {
                Some(loaded) if loaded.value.is_restorable(now) => loaded,
                Some(_) => {
                    return Err(LedgerError::not_found(
                        "archive record",
                        format!("{} (retention expired)", archive_id),
                    ))
                }
                None => return Err(LedgerError::not_found("archive record", archive_id)),
            };

            let mut family = vec![target.clone()];
            if target.value.delete_type == DeleteType::CategoryBulk {
                family.extend(self.store.archives()?.into_iter().filter(|other| {
                    other.value.id != archive_id
                        && other.value.same_bulk_group(&target.value)
                        && other.value.is_restorable(now)
                }));
            }

            let mut batch = WriteBatch::unsequenced();
            let mut restored = Vec::with_capacity(family.len());
            for archived in &family {
                let record = archived.value.original_data.clone();
                batch.remove_archive(archived);
                batch.insert_asset(&record)?;
                let holder = UnitHolder::Live(record.id);
                if let Some(serial) = &record.serial_number {
                    batch.hand_over(Reserved::Serial.key(serial), holder)?;
                }
                if let Some(phone) = &record.phone_number {
                    batch.hand_over(Reserved::Phone.key(phone), holder)?;
                }
                restored.push((archived.value.id, record));
            }

            // The earliest deletion in the family saw the level before any
            // of these units left. A level raised since then is kept.
            let group = target.value.group();
            let stored = self.store.summary(&group)?;
            let mut summary = stored
                .as_ref()
                .map_or_else(|| AggregateSummary::empty(group.clone()), |s| s.value.clone());
            let declared = family
                .iter()
                .map(|archived| archived.value.declared_stock)
                .fold(summary.admin_defined_stock(), u64::max);
            if summary.admin_defined_stock() != declared {
                summary.record_stock_change(
                    StockOperationKind::Restore,
                    declared,
                    format!("declared stock from before deletion of {}", archive_id),
                    Some(restored_by.clone()),
                    now,
                );
                batch.put_summary(stored.as_ref(), &summary)?;
            }
            Ok(self.store.commit(batch)?.then_some(restored))
        })?;

        let mut events = Vec::with_capacity(restored.len());
        let mut records = Vec::with_capacity(restored.len());
        for (archive_id, record) in restored {
            info!(
                %archive_id,
                asset_id = %record.id,
                restored_by = %restored_by,
                "Unit restored"
            );
            events.push(LedgerEvent::UnitRestored {
                archive_id,
                asset_id: record.id,
                group: record.group(),
            });
            records.push(record);
        }
        self.announce(events);
        Ok(records)
    }

    /// Destroy archive records whose retention has run out.
    ///
    /// Each record is purged in its own batch, so an interrupted sweep
    /// leaves every record either fully purged or untouched.
    pub(crate) fn purge_archive(&self) -> Result<usize, LedgerError> {
        let now = self.time_source.now();
        let mut candidates: Vec<ArchiveRecord> = self
            .store
            .archives()?
            .into_iter()
            .map(|loaded| loaded.value)
            .filter(|record| record.is_purge_eligible(now))
            .collect();
        candidates.sort_by(|a, b| {
            a.permanent_delete_at
                .cmp(&b.permanent_delete_at)
                .then_with(|| a.id.cmp(&b.id))
        });
        candidates.truncate(self.config.purge_batch_limit);

        let mut purged = 0;
        let mut first_error = None;
        for candidate in candidates {
            match self.purge_one(candidate.id) {
                Ok(PurgeOutcome::Purged(record)) => {
                    purged += 1;
                    info!(
                        archive_id = %record.id,
                        asset_id = %record.asset_id(),
                        group = %record.group(),
                        "Archived unit purged"
                    );
                    self.announce(vec![LedgerEvent::ArchivePurged {
                        archive_id: record.id,
                        asset_id: record.asset_id(),
                        group: record.group(),
                    }]);
                }
                Ok(PurgeOutcome::Skipped) => {}
                Err(error) => {
                    warn!(archive_id = %candidate.id, %error, "Failed to purge archived unit");
                    first_error.get_or_insert(error);
                }
            }
        }

        match first_error {
            Some(error) if purged == 0 => Err(error),
            _ => Ok(purged),
        }
    }

    fn purge_one(&self, archive_id: ArchiveId) -> Result<PurgeOutcome, LedgerError> {
        self.with_retries("purge_expired", || {
            let now = self.time_source.now();
            let Some(loaded) = self.store.archive(&archive_id)? else {
                return Ok(Some(PurgeOutcome::Skipped));
            };
            if !loaded.value.is_purge_eligible(now) {
                return Ok(Some(PurgeOutcome::Skipped));
            }
            let record = &loaded.value;
            let original = &record.original_data;

            let mut batch = WriteBatch::new(self.store.ledger_head()?);
            batch.remove_archive(&loaded);
            self.release_reservations(
                &mut batch,
                record.serial_number.as_deref(),
                record.phone_number.as_deref(),
                UnitHolder::Archived(record.id),
            )?;
            batch.append(
                PendingEntry::for_record(
                    original,
                    TransferType::OwnershipChange,
                    original.owner().into(),
                    OwnershipSnapshot::removed(),
                    now,
                )
                .reason(Some(format!(
                    "retention expired after deletion: {}",
                    record.delete_reason
                ))),
            )?;

            Ok(self
                .store
                .commit(batch)?
                .then(|| PurgeOutcome::Purged(loaded.value.clone())))
        })
    }

    /// Archive contents, soonest purge first.
    pub(crate) fn archive_listing(&self) -> Result<Vec<ArchiveRecord>, LedgerError> {
        let mut records: Vec<ArchiveRecord> = self
            .store
            .archives()?
            .into_iter()
            .map(|loaded| loaded.value)
            .collect();
        records.sort_by(|a, b| {
            a.permanent_delete_at
                .cmp(&b.permanent_delete_at)
                .then_with(|| a.id.cmp(&b.id))
        });
        Ok(records)
    }
}
