//! # Inbound Ports (Driving Ports)
//!
//! The API the ledger exposes to collaborators: approval workflows,
//! self-report intake, the admin stock editor and reporting views.
//!
//! Every mutating call either commits fully (record change, index
//! maintenance and ledger entries in one atomic batch) or returns an error
//! with nothing written.

use crate::domain::archive::{ArchiveRecord, DeleteRequest};
use crate::domain::asset::{AssetRecord, NewUnit, OwnerRef};
use crate::domain::errors::LedgerError;
use crate::domain::ledger::{TransferContext, TransferLedgerEntry};
use crate::domain::summary::AggregateSummary;
use shared_types::{ArchiveId, AssetId, ConfigId, GroupKey, TransferType, UserId};

/// Move one unit between owners.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransferRequest {
    pub asset_id: AssetId,
    /// Owner the caller believes holds the unit now.
    pub expected_from: OwnerRef,
    pub to: OwnerRef,
    pub transfer_type: TransferType,
    pub processed_by: UserId,
    pub context: TransferContext,
}

impl TransferRequest {
    pub fn new(
        asset_id: AssetId,
        expected_from: OwnerRef,
        to: OwnerRef,
        transfer_type: TransferType,
        processed_by: impl Into<UserId>,
    ) -> Self {
        Self {
            asset_id,
            expected_from,
            to,
            transfer_type,
            processed_by: processed_by.into(),
            context: TransferContext::default(),
        }
    }

    pub fn with_context(mut self, context: TransferContext) -> Self {
        self.context = context;
        self
    }
}

/// Change a unit's status (and optionally its condition).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusChangeRequest {
    pub asset_id: AssetId,
    pub new_status_id: ConfigId,
    pub new_condition_id: Option<ConfigId>,
    pub changed_by: UserId,
    pub reason: Option<String>,
}

impl StatusChangeRequest {
    pub fn new(
        asset_id: AssetId,
        new_status_id: impl Into<ConfigId>,
        changed_by: impl Into<UserId>,
    ) -> Self {
        Self {
            asset_id,
            new_status_id: new_status_id.into(),
            new_condition_id: None,
            changed_by: changed_by.into(),
            reason: None,
        }
    }

    pub fn with_condition(mut self, condition: impl Into<ConfigId>) -> Self {
        self.new_condition_id = Some(condition.into());
        self
    }

    pub fn with_reason(mut self, reason: impl Into<String>) -> Self {
        self.reason = Some(reason.into());
        self
    }
}

/// Whose ledger history to read.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HistoryQuery {
    /// Every entry for one unit.
    Asset(AssetId),
    /// Every entry where the user is on either side.
    User(UserId),
}

/// Primary API of the Asset Ownership Ledger.
pub trait AssetLedgerApi {
    // =========================================================================
    // UNITS
    // =========================================================================

    /// Create a unit.
    ///
    /// ## Errors
    ///
    /// - `Validation`: bad name/phone, unknown category/status/condition,
    ///   `addedBy=user` without `addedByUserId`, or an owner type that
    ///   contradicts the user id
    /// - `DuplicateSerial` / `DuplicatePhone`: held by a live or archived unit
    fn create_unit(&self, unit: NewUnit) -> Result<AssetRecord, LedgerError>;

    /// Move a unit from `expected_from` to `to`.
    ///
    /// ## Errors
    ///
    /// - `NotFound`: no live unit with this id
    /// - `OwnershipMismatch`: current owner differs from `expected_from`,
    ///   including when a concurrent transfer won the race
    fn transfer_unit(&self, request: TransferRequest) -> Result<AssetRecord, LedgerError>;

    /// Change status/condition. A request that changes nothing returns the
    /// record untouched and writes no ledger entry.
    fn change_status(&self, request: StatusChangeRequest) -> Result<AssetRecord, LedgerError>;

    /// Look up one live unit.
    fn get_unit(&self, asset_id: AssetId) -> Result<AssetRecord, LedgerError>;

    // =========================================================================
    // ARCHIVE
    // =========================================================================

    /// Move a live unit into the archive.
    fn delete_unit(
        &self,
        asset_id: AssetId,
        request: DeleteRequest,
    ) -> Result<ArchiveRecord, LedgerError>;

    /// Archive every live unit of a group as `category_bulk`, atomically.
    fn delete_group(
        &self,
        group: &GroupKey,
        request: DeleteRequest,
    ) -> Result<Vec<ArchiveRecord>, LedgerError>;

    /// Restore an archive record; for `category_bulk` every restorable
    /// record of the same bulk deletion comes back too.
    ///
    /// ## Errors
    ///
    /// - `NotFound`: unknown, already restored, purged, or past its
    ///   retention deadline
    fn restore_unit(
        &self,
        archive_id: ArchiveId,
        restored_by: &UserId,
    ) -> Result<Vec<AssetRecord>, LedgerError>;

    /// Destroy archive records past their deadline. Returns how many.
    fn purge_expired(&self) -> Result<usize, LedgerError>;

    /// Archive contents, soonest deadline first.
    fn list_archive(&self) -> Result<Vec<ArchiveRecord>, LedgerError>;

    // =========================================================================
    // QUERIES
    // =========================================================================

    /// Admin-held, non-terminal units of a group, oldest first.
    fn query_available(
        &self,
        group: &GroupKey,
        limit: usize,
    ) -> Result<Vec<AssetRecord>, LedgerError>;

    fn query_user_owned(&self, user: &UserId) -> Result<Vec<AssetRecord>, LedgerError>;

    fn find_by_serial(&self, serial: &str) -> Result<Option<AssetRecord>, LedgerError>;

    fn find_by_phone(&self, phone: &str) -> Result<Option<AssetRecord>, LedgerError>;

    /// Summary of one group. `NotFound` for a group that never existed.
    fn query_group_summary(&self, group: &GroupKey) -> Result<AggregateSummary, LedgerError>;

    /// Every stored group summary.
    fn query_groups(&self) -> Result<Vec<AggregateSummary>, LedgerError>;

    /// Ledger entries, newest first.
    fn query_history(&self, query: HistoryQuery) -> Result<Vec<TransferLedgerEntry>, LedgerError>;

    // =========================================================================
    // STOCK
    // =========================================================================

    /// Declare the admin-held stock level; the fungible pool follows.
    fn set_admin_stock(
        &self,
        group: &GroupKey,
        value: u64,
        reason: &str,
        admin: &UserId,
    ) -> Result<AggregateSummary, LedgerError>;

    /// Change the declared stock level by `delta`.
    fn adjust_admin_stock(
        &self,
        group: &GroupKey,
        delta: i64,
        reason: &str,
        admin: &UserId,
    ) -> Result<AggregateSummary, LedgerError>;

    /// Resize the fungible (unserialized) pool to exactly `target` units.
    ///
    /// ## Errors
    ///
    /// - `InsufficientSafeUnits`: a shrink would need non-disposable units;
    ///   nothing is removed
    fn sync_admin_stock_units(
        &self,
        group: &GroupKey,
        target: u64,
        reason: &str,
        admin: &UserId,
    ) -> Result<AggregateSummary, LedgerError>;

    /// Rebuild every group summary. Returns how many groups were touched.
    fn recompute_all(&self) -> Result<usize, LedgerError>;
}
