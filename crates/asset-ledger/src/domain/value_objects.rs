//! # Value Objects
//!
//! Ledger configuration and the storage key layout.

use shared_types::{ArchiveId, AssetId, GroupKey, UserId, DEFAULT_RETENTION_DAYS, SECONDS_PER_DAY};

/// Configuration for the ledger service.
///
/// All values have sensible defaults for production use.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LedgerConfig {
    /// Seconds an archived unit stays restorable (default: 30 days).
    pub retention_secs: u64,

    /// Attempts for a guarded write that keeps losing races (default: 8).
    pub max_write_retries: u32,

    /// Upper bound on `limit` for availability queries (default: 500).
    pub max_query_limit: usize,

    /// Archive records destroyed per purge sweep (default: 1000).
    pub purge_batch_limit: usize,

    /// Units one stock operation may create (default: 10000).
    pub max_stock_batch: u64,
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            retention_secs: DEFAULT_RETENTION_DAYS * SECONDS_PER_DAY,
            max_write_retries: 8,
            max_query_limit: 500,
            purge_batch_limit: 1000,
            max_stock_batch: 10_000,
        }
    }
}

impl LedgerConfig {
    /// Create a new configuration with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the retention window in days.
    pub fn with_retention_days(mut self, days: u64) -> Self {
        self.retention_secs = days.saturating_mul(SECONDS_PER_DAY);
        self
    }

    /// Set the number of write attempts under contention.
    pub fn with_max_write_retries(mut self, retries: u32) -> Self {
        self.max_write_retries = retries.max(1);
        self
    }

    /// Set the cap on availability query limits.
    pub fn with_max_query_limit(mut self, limit: usize) -> Self {
        self.max_query_limit = limit;
        self
    }

    /// Set how many archive records one purge sweep may destroy.
    pub fn with_purge_batch_limit(mut self, limit: usize) -> Self {
        self.purge_batch_limit = limit;
        self
    }

    /// Set how many units one stock operation may create.
    pub fn with_max_stock_batch(mut self, limit: u64) -> Self {
        self.max_stock_batch = limit;
        self
    }
}

/// Key prefixes for the key-value store.
///
/// All keys are prefixed to namespace different data types. Variable-length
/// components are length-prefixed so that one group or user can never be a
/// byte prefix of another.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyPrefix {
    /// Live unit: `a:{asset_id}` -> AssetRecord
    Asset,
    /// Serial reservation: `s:{serial}` -> Reservation
    Serial,
    /// Phone reservation: `p:{phone}` -> Reservation
    Phone,
    /// Group membership: `g:{category}{item}{asset_id}` -> AssetId
    GroupIndex,
    /// User holdings: `o:{user}{asset_id}` -> AssetId
    OwnerIndex,
    /// Archive record: `r:{archive_id}` -> ArchiveRecord
    Archive,
    /// Ledger entry: `l:{sequence}` -> TransferLedgerEntry
    Ledger,
    /// Entries per asset: `h:{asset_id}{sequence}` -> sequence
    AssetHistory,
    /// Entries per user: `u:{user}{sequence}` -> sequence
    UserHistory,
    /// Group summary: `v:{category}{item}` -> AggregateSummary
    Summary,
    /// Counters: `m:{name}` -> u64
    Metadata,
}

impl KeyPrefix {
    /// Get the byte prefix for this key type.
    pub fn as_bytes(&self) -> &'static [u8] {
        match self {
            KeyPrefix::Asset => b"a:",
            KeyPrefix::Serial => b"s:",
            KeyPrefix::Phone => b"p:",
            KeyPrefix::GroupIndex => b"g:",
            KeyPrefix::OwnerIndex => b"o:",
            KeyPrefix::Archive => b"r:",
            KeyPrefix::Ledger => b"l:",
            KeyPrefix::AssetHistory => b"h:",
            KeyPrefix::UserHistory => b"u:",
            KeyPrefix::Summary => b"v:",
            KeyPrefix::Metadata => b"m:",
        }
    }

    /// Build a full key with the given suffix.
    pub fn key(&self, suffix: &[u8]) -> Vec<u8> {
        let mut key = self.as_bytes().to_vec();
        key.extend_from_slice(suffix);
        key
    }

    pub fn asset_key(id: &AssetId) -> Vec<u8> {
        KeyPrefix::Asset.key(id.as_bytes())
    }

    pub fn serial_key(serial: &str) -> Vec<u8> {
        KeyPrefix::Serial.key(serial.as_bytes())
    }

    pub fn phone_key(phone: &str) -> Vec<u8> {
        KeyPrefix::Phone.key(phone.as_bytes())
    }

    /// Prefix shared by every unit of `group`.
    pub fn group_prefix(group: &GroupKey) -> Vec<u8> {
        let mut key = KeyPrefix::GroupIndex.key(&[]);
        push_component(&mut key, group.category_id.as_str().as_bytes());
        push_component(&mut key, group.item_name.as_bytes());
        key
    }

    pub fn group_index_key(group: &GroupKey, id: &AssetId) -> Vec<u8> {
        let mut key = Self::group_prefix(group);
        key.extend_from_slice(id.as_bytes());
        key
    }

    /// Prefix shared by every unit `user` holds.
    pub fn owner_prefix(user: &UserId) -> Vec<u8> {
        let mut key = KeyPrefix::OwnerIndex.key(&[]);
        push_component(&mut key, user.as_str().as_bytes());
        key
    }

    pub fn owner_index_key(user: &UserId, id: &AssetId) -> Vec<u8> {
        let mut key = Self::owner_prefix(user);
        key.extend_from_slice(id.as_bytes());
        key
    }

    pub fn archive_key(id: &ArchiveId) -> Vec<u8> {
        KeyPrefix::Archive.key(id.as_bytes())
    }

    /// Prefix of every archive record.
    pub fn archive_prefix() -> Vec<u8> {
        KeyPrefix::Archive.key(&[])
    }

    pub fn ledger_key(sequence: u64) -> Vec<u8> {
        KeyPrefix::Ledger.key(&sequence.to_be_bytes())
    }

    pub fn asset_history_prefix(id: &AssetId) -> Vec<u8> {
        KeyPrefix::AssetHistory.key(id.as_bytes())
    }

    pub fn asset_history_key(id: &AssetId, sequence: u64) -> Vec<u8> {
        let mut key = Self::asset_history_prefix(id);
        key.extend_from_slice(&sequence.to_be_bytes());
        key
    }

    pub fn user_history_prefix(user: &UserId) -> Vec<u8> {
        let mut key = KeyPrefix::UserHistory.key(&[]);
        push_component(&mut key, user.as_str().as_bytes());
        key
    }

    pub fn user_history_key(user: &UserId, sequence: u64) -> Vec<u8> {
        let mut key = Self::user_history_prefix(user);
        key.extend_from_slice(&sequence.to_be_bytes());
        key
    }

    pub fn summary_key(group: &GroupKey) -> Vec<u8> {
        let mut key = KeyPrefix::Summary.key(&[]);
        push_component(&mut key, group.category_id.as_str().as_bytes());
        push_component(&mut key, group.item_name.as_bytes());
        key
    }

    /// Prefix of every group summary.
    pub fn summary_prefix() -> Vec<u8> {
        KeyPrefix::Summary.key(&[])
    }

    /// Last ledger sequence number handed out.
    pub fn ledger_sequence_key() -> Vec<u8> {
        KeyPrefix::Metadata.key(b"ledger-seq")
    }
}

fn push_component(key: &mut Vec<u8>, component: &[u8]) {
    key.extend_from_slice(&(component.len() as u32).to_be_bytes());
    key.extend_from_slice(component);
}
