//! # Domain Errors
//!
//! Error types for the Asset Ownership Ledger.
//!
//! Every ledger operation either fully succeeds or returns one of the
//! [`LedgerError`] kinds below with nothing committed. Only
//! [`LedgerError::Persistence`] is worth retrying with the same input.

use crate::domain::asset::OwnerRef;
use serde::{Deserialize, Serialize};
use shared_types::{ArchiveId, AssetId, GroupKey};
use std::fmt;
use thiserror::Error;

/// Who currently holds a serial number or phone number.
///
/// Also the stored value of a serial/phone reservation key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum UnitHolder {
    /// A live unit in the primary store.
    Live(AssetId),
    /// A unit sitting in the archive, still restorable.
    Archived(ArchiveId),
}

impl fmt::Display for UnitHolder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UnitHolder::Live(id) => write!(f, "live unit {}", id),
            UnitHolder::Archived(id) => write!(f, "archived unit {}", id),
        }
    }
}

/// Errors returned by ledger operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LedgerError {
    /// Input rejected before any read of existing state mattered.
    #[error("Validation failed for {field}: {reason}")]
    Validation { field: &'static str, reason: String },

    /// Serial number already held by a live or archived unit.
    #[error("Serial number {serial:?} is already held by {holder}")]
    DuplicateSerial { serial: String, holder: UnitHolder },

    /// Phone number already held by a live or archived unit.
    #[error("Phone number {phone:?} is already held by {holder}")]
    DuplicatePhone { phone: String, holder: UnitHolder },

    /// The unit's current owner differs from what the caller expected.
    #[error("Ownership mismatch on {asset_id}: expected {expected}, found {actual}")]
    OwnershipMismatch {
        asset_id: AssetId,
        expected: OwnerRef,
        actual: OwnerRef,
    },

    /// Unknown unit, archive record, group, or an expired archive record.
    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: String },

    /// A stock shrink needs more removable units than exist.
    #[error(
        "Insufficient safe units in {group}: need to remove {required}, \
         only {available} are available and working"
    )]
    InsufficientSafeUnits {
        group: GroupKey,
        required: u64,
        available: u64,
    },

    /// Storage failed or stayed contended. Nothing was committed.
    #[error("Persistence failure: {message}")]
    Persistence { message: String },
}

impl LedgerError {
    /// Whether retrying the same request may succeed.
    #[must_use]
    pub fn is_transient(&self) -> bool {
        matches!(self, LedgerError::Persistence { .. })
    }

    pub(crate) fn validation(field: &'static str, reason: impl Into<String>) -> Self {
        LedgerError::Validation {
            field,
            reason: reason.into(),
        }
    }

    pub(crate) fn not_found(entity: &'static str, id: impl fmt::Display) -> Self {
        LedgerError::NotFound {
            entity,
            id: id.to_string(),
        }
    }
}

/// Key-value store errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum KVStoreError {
    /// I/O error during read/write.
    #[error("KV store I/O error: {message}")]
    IOError { message: String },

    /// Data corruption in the store.
    #[error("KV store corruption: {message}")]
    CorruptionError { message: String },

    /// A guard in an atomic batch did not hold. Nothing was written.
    #[error("Write condition failed on key {key:02x?}")]
    ConditionFailed { key: Vec<u8> },
}

impl From<KVStoreError> for LedgerError {
    fn from(err: KVStoreError) -> Self {
        LedgerError::Persistence {
            message: err.to_string(),
        }
    }
}

/// Serialization errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Serialization error: {message}")]
pub struct SerializationError {
    pub message: String,
}

impl From<SerializationError> for LedgerError {
    fn from(err: SerializationError) -> Self {
        LedgerError::Persistence {
            message: err.message,
        }
    }
}
