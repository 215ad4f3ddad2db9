//! # Archive Records
//!
//! The recycle bin. Deleting a unit moves it here with a full snapshot of
//! the live record. It can be restored until `permanent_delete_at`; after
//! that the purge sweep destroys it.
//!
//! Restoring deletes the archive record, so "already restored" is simply
//! "not found".
//!
//! ## Retention boundary
//!
//! | `now` vs `permanent_delete_at` | restorable | purge-eligible |
//! |--------------------------------|------------|----------------|
//! | before                         | yes        | no             |
//! | equal                          | no         | no             |
//! | after                          | no         | yes            |

use crate::domain::asset::AssetRecord;
use serde::{Deserialize, Serialize};
use shared_types::{
    ArchiveId, AssetId, ConfigId, DeleteType, GroupKey, Timestamp, UserId, SECONDS_PER_DAY,
};

/// Who deleted a unit and why.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeleteRequest {
    pub delete_type: DeleteType,
    pub reason: String,
    pub deleted_by: UserId,
    pub deleted_by_name: String,
}

impl DeleteRequest {
    /// Delete a single unit.
    pub fn individual(
        reason: impl Into<String>,
        deleted_by: impl Into<UserId>,
        deleted_by_name: impl Into<String>,
    ) -> Self {
        Self {
            delete_type: DeleteType::IndividualItem,
            reason: reason.into(),
            deleted_by: deleted_by.into(),
            deleted_by_name: deleted_by_name.into(),
        }
    }

    /// Delete as part of a whole group.
    pub fn category_bulk(
        reason: impl Into<String>,
        deleted_by: impl Into<UserId>,
        deleted_by_name: impl Into<String>,
    ) -> Self {
        Self {
            delete_type: DeleteType::CategoryBulk,
            ..Self::individual(reason, deleted_by, deleted_by_name)
        }
    }
}

/// A soft-deleted unit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArchiveRecord {
    pub id: ArchiveId,
    pub item_name: String,
    pub category_id: ConfigId,
    pub serial_number: Option<String>,
    pub phone_number: Option<String>,
    pub delete_type: DeleteType,
    pub delete_reason: String,
    pub deleted_by: UserId,
    pub deleted_by_name: String,
    pub deleted_at: Timestamp,
    pub permanent_delete_at: Timestamp,
    /// Everything needed to put the unit back.
    pub original_data: AssetRecord,
    /// The group's declared admin stock just before the deletion. Restoring
    /// puts it back.
    pub declared_stock: u64,
}

impl ArchiveRecord {
    /// Snapshot `record` into a new archive record. `declared_stock` is
    /// the group's declared level at the time of deletion.
    #[must_use]
    pub fn capture(
        record: AssetRecord,
        request: &DeleteRequest,
        declared_stock: u64,
        now: Timestamp,
        retention_secs: u64,
    ) -> Self {
        Self {
            id: ArchiveId::new(),
            item_name: record.item_name.clone(),
            category_id: record.category_id.clone(),
            serial_number: record.serial_number.clone(),
            phone_number: record.phone_number.clone(),
            delete_type: request.delete_type,
            delete_reason: request.reason.clone(),
            deleted_by: request.deleted_by.clone(),
            deleted_by_name: request.deleted_by_name.clone(),
            deleted_at: now,
            permanent_delete_at: now.saturating_add(retention_secs),
            original_data: record,
            declared_stock,
        }
    }

    #[must_use]
    pub fn asset_id(&self) -> AssetId {
        self.original_data.id
    }

    #[must_use]
    pub fn group(&self) -> GroupKey {
        GroupKey::new(&self.item_name, self.category_id.clone())
    }

    #[must_use]
    pub fn is_restorable(&self, now: Timestamp) -> bool {
        now < self.permanent_delete_at
    }

    #[must_use]
    pub fn is_purge_eligible(&self, now: Timestamp) -> bool {
        self.permanent_delete_at < now
    }

    /// Whole days left before the record stops being restorable,
    /// rounded up. Zero once expired.
    #[must_use]
    pub fn days_remaining(&self, now: Timestamp) -> u64 {
        self.permanent_delete_at
            .saturating_sub(now)
            .div_ceil(SECONDS_PER_DAY)
    }

    /// Whether `other` was removed in the same bulk deletion family.
    #[must_use]
    pub fn same_bulk_group(&self, other: &ArchiveRecord) -> bool {
        self.delete_type == DeleteType::CategoryBulk
            && other.delete_type == DeleteType::CategoryBulk
            && self.item_name == other.item_name
            && self.category_id == other.category_id
    }
}
