//! # Transfer Ledger Entries
//!
//! Append-only audit trail. An entry is written in the same atomic batch
//! as the mutation it describes and is never updated afterwards.
//!
//! Entries carry a sequence number from a monotonic counter, so
//! "newest first" is simply descending sequence order.

use crate::domain::asset::{AssetRecord, OwnerRef};
use serde::{Deserialize, Serialize};
use shared_types::{AssetId, ConfigId, OwnerType, Timestamp, TransferType, UserId};

/// Position of an entry in the ledger. Strictly increasing.
pub type LedgerSequence = u64;

/// Owner side of a ledger entry.
///
/// Besides the two live owner types, the ledger needs a source for
/// creations and a sink for permanent removals.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LedgerOwnerType {
    NewItem,
    AdminStock,
    UserOwned,
    Removed,
}

impl From<OwnerType> for LedgerOwnerType {
    fn from(owner: OwnerType) -> Self {
        match owner {
            OwnerType::AdminStock => LedgerOwnerType::AdminStock,
            OwnerType::UserOwned => LedgerOwnerType::UserOwned,
        }
    }
}

/// `{ ownerType, userId? }` as recorded in an entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OwnershipSnapshot {
    pub owner_type: LedgerOwnerType,
    pub user_id: Option<UserId>,
}

impl OwnershipSnapshot {
    #[must_use]
    pub fn new_item() -> Self {
        Self {
            owner_type: LedgerOwnerType::NewItem,
            user_id: None,
        }
    }

    #[must_use]
    pub fn removed() -> Self {
        Self {
            owner_type: LedgerOwnerType::Removed,
            user_id: None,
        }
    }
}

impl From<&OwnerRef> for OwnershipSnapshot {
    fn from(owner: &OwnerRef) -> Self {
        Self {
            owner_type: owner.owner_type().into(),
            user_id: owner.user_id().cloned(),
        }
    }
}

/// Status/condition movement recorded by a `status_change` entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusChange {
    pub from_status: ConfigId,
    pub to_status: ConfigId,
    pub from_condition: ConfigId,
    pub to_condition: ConfigId,
}

/// Optional references attached to a transfer.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransferContext {
    pub approved_by: Option<UserId>,
    pub request_id: Option<String>,
    pub return_id: Option<String>,
    pub reason: Option<String>,
}

impl TransferContext {
    pub fn approved_by(mut self, user: impl Into<UserId>) -> Self {
        self.approved_by = Some(user.into());
        self
    }

    pub fn request(mut self, request_id: impl Into<String>) -> Self {
        self.request_id = Some(request_id.into());
        self
    }

    pub fn return_ref(mut self, return_id: impl Into<String>) -> Self {
        self.return_id = Some(return_id.into());
        self
    }

    pub fn reason(mut self, reason: impl Into<String>) -> Self {
        self.reason = Some(reason.into());
        self
    }
}

/// One immutable ledger entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransferLedgerEntry {
    pub sequence: LedgerSequence,
    pub asset_id: AssetId,
    pub item_name: String,
    pub category_id: ConfigId,
    pub serial_number: Option<String>,
    pub transfer_type: TransferType,
    pub from_ownership: OwnershipSnapshot,
    pub to_ownership: OwnershipSnapshot,
    pub transfer_date: Timestamp,
    pub processed_by: Option<UserId>,
    pub approved_by: Option<UserId>,
    pub request_id: Option<String>,
    pub return_id: Option<String>,
    pub reason: Option<String>,
    pub status_change: Option<StatusChange>,
}

impl TransferLedgerEntry {
    /// Users this entry should be listed under (either side, deduplicated).
    #[must_use]
    pub fn involved_users(&self) -> Vec<&UserId> {
        let mut users = Vec::with_capacity(2);
        if let Some(from) = &self.from_ownership.user_id {
            users.push(from);
        }
        if let Some(to) = &self.to_ownership.user_id {
            if !users.contains(&to) {
                users.push(to);
            }
        }
        users
    }
}

/// An entry waiting for its sequence number.
///
/// The service fills in `sequence` while assembling the commit batch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingEntry {
    entry: TransferLedgerEntry,
}

impl PendingEntry {
    /// Entry describing `record` moving `from` -> `to`.
    #[must_use]
    pub fn for_record(
        record: &AssetRecord,
        transfer_type: TransferType,
        from: OwnershipSnapshot,
        to: OwnershipSnapshot,
        now: Timestamp,
    ) -> Self {
        Self {
            entry: TransferLedgerEntry {
                sequence: 0,
                asset_id: record.id,
                item_name: record.item_name.clone(),
                category_id: record.category_id.clone(),
                serial_number: record.serial_number.clone(),
                transfer_type,
                from_ownership: from,
                to_ownership: to,
                transfer_date: now,
                processed_by: None,
                approved_by: None,
                request_id: None,
                return_id: None,
                reason: None,
                status_change: None,
            },
        }
    }

    pub fn processed_by(mut self, user: Option<UserId>) -> Self {
        self.entry.processed_by = user;
        self
    }

    pub fn context(mut self, context: &TransferContext) -> Self {
        self.entry.approved_by = context.approved_by.clone();
        self.entry.request_id = context.request_id.clone();
        self.entry.return_id = context.return_id.clone();
        self.entry.reason = context.reason.clone();
        self
    }

    pub fn reason(mut self, reason: Option<String>) -> Self {
        self.entry.reason = reason;
        self
    }

    pub fn status_change(mut self, change: StatusChange) -> Self {
        self.entry.status_change = Some(change);
        self
    }

    /// Stamp the sequence number.
    #[must_use]
    pub fn seal(mut self, sequence: LedgerSequence) -> TransferLedgerEntry {
        self.entry.sequence = sequence;
        self.entry
    }
}
