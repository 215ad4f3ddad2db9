//! # Asset Ledger API Implementation
//!
//! Implements the AssetLedgerApi trait. Mutations delegate to the
//! operation modules; reads are served here directly.

use super::helpers::Reserved;
use super::stock::StockChange;
use super::*;
use crate::domain::archive::{ArchiveRecord, DeleteRequest};
use crate::domain::asset::NewUnit;
use crate::domain::ledger::TransferLedgerEntry;
use crate::domain::summary::AggregateSummary;
use crate::domain::validation;
use crate::domain::value_objects::KeyPrefix;
use crate::ports::inbound::{HistoryQuery, StatusChangeRequest, TransferRequest};
use shared_types::{ArchiveId, AssetId, GroupKey, UserId};
use std::collections::BTreeSet;
use tracing::info;

impl<KV, TS, CAT> AssetLedgerApi for AssetLedgerService<KV, TS, CAT>
where
    KV: KeyValueStore + 'static,
    TS: TimeSource + 'static,
    CAT: StatusCatalog,
{
    fn create_unit(&self, unit: NewUnit) -> Result<AssetRecord, LedgerError> {
        self.commit_new_unit(unit)
    }

    fn transfer_unit(&self, request: TransferRequest) -> Result<AssetRecord, LedgerError> {
        self.commit_transfer(request)
    }

    fn change_status(&self, request: StatusChangeRequest) -> Result<AssetRecord, LedgerError> {
        self.commit_status_change(request)
    }

    fn get_unit(&self, asset_id: AssetId) -> Result<AssetRecord, LedgerError> {
        Ok(self.store.require_asset(&asset_id)?.value)
    }

    fn delete_unit(
        &self,
        asset_id: AssetId,
        request: DeleteRequest,
    ) -> Result<ArchiveRecord, LedgerError> {
        self.archive_unit(asset_id, request)
    }

    fn delete_group(
        &self,
        group: &GroupKey,
        request: DeleteRequest,
    ) -> Result<Vec<ArchiveRecord>, LedgerError> {
        self.archive_group(group, request)
    }

    fn restore_unit(
        &self,
        archive_id: ArchiveId,
        restored_by: &UserId,
    ) -> Result<Vec<AssetRecord>, LedgerError> {
        self.restore_archived(archive_id, restored_by)
    }

    fn purge_expired(&self) -> Result<usize, LedgerError> {
        self.purge_archive()
    }

    fn list_archive(&self) -> Result<Vec<ArchiveRecord>, LedgerError> {
        self.archive_listing()
    }

    fn query_available(
        &self,
        group: &GroupKey,
        limit: usize,
    ) -> Result<Vec<AssetRecord>, LedgerError> {
        let group = self.checked_group(group)?;
        self.available_units(&group, limit)
    }

    fn query_user_owned(&self, user: &UserId) -> Result<Vec<AssetRecord>, LedgerError> {
        self.units_owned_by(user)
    }

    fn find_by_serial(&self, serial: &str) -> Result<Option<AssetRecord>, LedgerError> {
        match validation::serial_number(Some(serial)) {
            Some(serial) => self.live_holder(Reserved::Serial, &serial),
            None => Ok(None),
        }
    }

    fn find_by_phone(&self, phone: &str) -> Result<Option<AssetRecord>, LedgerError> {
        match validation::phone_number(Some(phone))? {
            Some(phone) => self.live_holder(Reserved::Phone, &phone),
            None => Ok(None),
        }
    }

    fn query_group_summary(&self, group: &GroupKey) -> Result<AggregateSummary, LedgerError> {
        let group = self.checked_group(group)?;
        if let Some(stored) = self.store.summary(&group)? {
            return Ok(stored.value);
        }
        if self.store.group_units(&group)?.is_empty() {
            return Err(LedgerError::not_found("group", &group));
        }
        self.projector.recompute(&group, RecomputeMode::AutoDetect)
    }

    fn query_groups(&self) -> Result<Vec<AggregateSummary>, LedgerError> {
        self.store.summaries()
    }

    fn query_history(&self, query: HistoryQuery) -> Result<Vec<TransferLedgerEntry>, LedgerError> {
        let prefix = match &query {
            HistoryQuery::Asset(id) => KeyPrefix::asset_history_prefix(id),
            HistoryQuery::User(user) => KeyPrefix::user_history_prefix(user),
        };
        self.store.history(&prefix)
    }

    fn set_admin_stock(
        &self,
        group: &GroupKey,
        value: u64,
        reason: &str,
        admin: &UserId,
    ) -> Result<AggregateSummary, LedgerError> {
        self.change_stock(group, StockChange::Set(value), reason, admin)
    }

    fn adjust_admin_stock(
        &self,
        group: &GroupKey,
        delta: i64,
        reason: &str,
        admin: &UserId,
    ) -> Result<AggregateSummary, LedgerError> {
        self.change_stock(group, StockChange::Adjust(delta), reason, admin)
    }

    fn sync_admin_stock_units(
        &self,
        group: &GroupKey,
        target: u64,
        reason: &str,
        admin: &UserId,
    ) -> Result<AggregateSummary, LedgerError> {
        self.change_stock(group, StockChange::Sync(target), reason, admin)
    }

    fn recompute_all(&self) -> Result<usize, LedgerError> {
        let mut groups: BTreeSet<GroupKey> = self
            .store
            .summaries()?
            .into_iter()
            .map(|summary| summary.group)
            .collect();
        groups.extend(self.store.all_units()?.iter().map(AssetRecord::group));

        for group in &groups {
            self.projector.recompute(group, RecomputeMode::AutoDetect)?;
        }
        info!(groups = groups.len(), "Recomputed all group summaries");
        Ok(groups.len())
    }
}
