//! # Outbound Ports (Driven Ports)
//!
//! Dependencies required by the ledger service. The host application
//! supplies these; `adapters` has in-process implementations.

use crate::domain::errors::{KVStoreError, LedgerError};
use crate::domain::events::LedgerEvent;
use shared_types::{ConfigId, Timestamp};
use tracing::warn;

/// Result of a prefix scan: `(key, value)` pairs in ascending key order.
pub type ScanResult = Vec<(Vec<u8>, Vec<u8>)>;

/// Abstract interface for key-value database operations.
///
/// The store is the only shared resource between service instances, so it
/// is where correctness under concurrency is decided. Implementations take
/// `&self` and synchronise internally.
pub trait KeyValueStore: Send + Sync {
    /// Get a value by key.
    fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>, KVStoreError>;

    /// Execute an atomic, guarded batch write.
    ///
    /// ## Atomicity
    ///
    /// Every `ExpectValue`/`ExpectAbsent` guard is checked against the
    /// current state and every write applied as one indivisible step.
    /// If any guard fails nothing is written and the call returns
    /// [`KVStoreError::ConditionFailed`] naming the first failing key.
    fn atomic_batch_write(&self, operations: Vec<BatchOperation>) -> Result<(), KVStoreError>;

    /// Check if a key exists.
    fn exists(&self, key: &[u8]) -> Result<bool, KVStoreError> {
        Ok(self.get(key)?.is_some())
    }

    /// All entries whose key starts with `prefix`, in ascending key order.
    fn prefix_scan(&self, prefix: &[u8]) -> Result<ScanResult, KVStoreError>;
}

/// Batch operation for atomic writes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BatchOperation {
    /// Put a key-value pair.
    Put { key: Vec<u8>, value: Vec<u8> },
    /// Delete a key.
    Delete { key: Vec<u8> },
    /// Guard: `key` currently holds exactly `value`.
    ExpectValue { key: Vec<u8>, value: Vec<u8> },
    /// Guard: `key` is currently absent.
    ExpectAbsent { key: Vec<u8> },
}

impl BatchOperation {
    /// Create a Put operation.
    pub fn put(key: impl Into<Vec<u8>>, value: impl Into<Vec<u8>>) -> Self {
        BatchOperation::Put {
            key: key.into(),
            value: value.into(),
        }
    }

    /// Create a Delete operation.
    pub fn delete(key: impl Into<Vec<u8>>) -> Self {
        BatchOperation::Delete { key: key.into() }
    }

    /// Guard that `key` still holds `value`.
    pub fn expect_value(key: impl Into<Vec<u8>>, value: impl Into<Vec<u8>>) -> Self {
        BatchOperation::ExpectValue {
            key: key.into(),
            value: value.into(),
        }
    }

    /// Guard that `key` does not exist.
    pub fn expect_absent(key: impl Into<Vec<u8>>) -> Self {
        BatchOperation::ExpectAbsent { key: key.into() }
    }

    /// Guard matching an observed read: the value if there was one,
    /// absence otherwise.
    pub fn expect(key: impl Into<Vec<u8>>, observed: Option<Vec<u8>>) -> Self {
        match observed {
            Some(value) => Self::expect_value(key, value),
            None => Self::expect_absent(key),
        }
    }

    #[must_use]
    pub fn is_guard(&self) -> bool {
        matches!(
            self,
            BatchOperation::ExpectValue { .. } | BatchOperation::ExpectAbsent { .. }
        )
    }
}

/// Abstract interface for time operations (for testability).
pub trait TimeSource: Send + Sync {
    /// Get current timestamp in seconds since epoch.
    fn now(&self) -> Timestamp;
}

/// The externally maintained configuration of categories, statuses and
/// conditions. The ledger only checks existence and reads a few flags.
pub trait StatusCatalog: Send + Sync {
    fn category_exists(&self, category: &ConfigId) -> bool;

    /// Whether units in `category` may carry a phone number.
    fn category_supports_phone(&self, category: &ConfigId) -> bool;

    fn status_exists(&self, status: &ConfigId) -> bool;

    fn condition_exists(&self, condition: &ConfigId) -> bool;

    /// Statuses such as "retired" that take a unit out of circulation.
    fn is_terminal_status(&self, status: &ConfigId) -> bool;

    /// Status given to new units when the caller names none.
    fn default_status(&self) -> ConfigId;

    /// Condition given to new units when the caller names none.
    fn default_condition(&self) -> ConfigId;

    /// Whether a stock unit in this state may be permanently removed by a
    /// stock shrink ("available" and "working").
    fn is_disposable(&self, status: &ConfigId, condition: &ConfigId) -> bool;
}

/// Receives every committed ledger event.
///
/// Events arrive in rounds: first everything one commit produced, then the
/// follow-ups the handlers answered with. Handler failures are logged and
/// never undo the commit that produced the event.
pub trait LedgerEventHandler: Send + Sync {
    /// Short name used in logs.
    fn name(&self) -> &'static str;

    fn handle(&self, event: &LedgerEvent) -> Result<Vec<LedgerEvent>, LedgerError>;

    /// Handle one round, in order. The default hands each event to
    /// [`handle`](Self::handle) and logs failures.
    fn handle_all(&self, events: &[LedgerEvent]) -> Vec<LedgerEvent> {
        let mut follow_ups = Vec::new();
        for event in events {
            match self.handle(event) {
                Ok(more) => follow_ups.extend(more),
                Err(error) => warn!(
                    handler = self.name(),
                    event = event.name(),
                    group = %event.group(),
                    %error,
                    "Ledger event handler failed"
                ),
            }
        }
        follow_ups
    }
}
