//! # Record Store
//!
//! Typed reads over the key-value store, plus [`WriteBatch`], the single
//! place where record changes, index maintenance and ledger appends are
//! assembled into one guarded atomic batch.

use crate::adapters::serializer::{decode, encode};
use crate::domain::archive::ArchiveRecord;
use crate::domain::asset::AssetRecord;
use crate::domain::errors::{KVStoreError, LedgerError, UnitHolder};
use crate::domain::ledger::{LedgerSequence, PendingEntry, TransferLedgerEntry};
use crate::domain::summary::AggregateSummary;
use crate::domain::value_objects::KeyPrefix;
use crate::ports::outbound::{BatchOperation, KeyValueStore};
use serde::de::DeserializeOwned;
use shared_types::{ArchiveId, AssetId, GroupKey, UserId};
use std::sync::Arc;

/// A decoded value together with the exact bytes it was read from.
///
/// The bytes become an `ExpectValue` guard when the value is written back.
#[derive(Debug, Clone)]
pub(crate) struct Loaded<T> {
    pub value: T,
    pub raw: Vec<u8>,
}

/// Last sequence number handed out, as read from the counter key.
#[derive(Debug, Clone)]
pub(crate) struct LedgerHead {
    last: LedgerSequence,
    raw: Option<Vec<u8>>,
}

/// Typed access to the ledger's key space.
pub(crate) struct RecordStore<KV> {
    kv: Arc<KV>,
}

impl<KV> Clone for RecordStore<KV> {
    fn clone(&self) -> Self {
        Self {
            kv: Arc::clone(&self.kv),
        }
    }
}

impl<KV: KeyValueStore> RecordStore<KV> {
    pub fn new(kv: Arc<KV>) -> Self {
        Self { kv }
    }

    pub fn kv(&self) -> &KV {
        &self.kv
    }

    fn load<T: DeserializeOwned>(&self, key: &[u8]) -> Result<Option<Loaded<T>>, LedgerError> {
        match self.kv.get(key)? {
            Some(raw) => Ok(Some(Loaded {
                value: decode(&raw)?,
                raw,
            })),
            None => Ok(None),
        }
    }

    // =========================================================================
    // UNITS
    // =========================================================================

    pub fn asset(&self, id: &AssetId) -> Result<Option<Loaded<AssetRecord>>, LedgerError> {
        self.load(&KeyPrefix::asset_key(id))
    }

    pub fn require_asset(&self, id: &AssetId) -> Result<Loaded<AssetRecord>, LedgerError> {
        self.asset(id)?
            .ok_or_else(|| LedgerError::not_found("asset", id))
    }

    /// Every live unit of `group`.
    ///
    /// Units removed between the index scan and the record read are skipped.
    pub fn group_units(&self, group: &GroupKey) -> Result<Vec<Loaded<AssetRecord>>, LedgerError> {
        self.units_under(&KeyPrefix::group_prefix(group))
    }

    /// Every live unit currently held by `user`.
    pub fn owner_units(&self, user: &UserId) -> Result<Vec<Loaded<AssetRecord>>, LedgerError> {
        self.units_under(&KeyPrefix::owner_prefix(user))
    }

    fn units_under(&self, prefix: &[u8]) -> Result<Vec<Loaded<AssetRecord>>, LedgerError> {
        let mut units = Vec::new();
        for (_, value) in self.kv.prefix_scan(prefix)? {
            let id: AssetId = decode(&value)?;
            if let Some(unit) = self.asset(&id)? {
                units.push(unit);
            }
        }
        Ok(units)
    }

    /// Every live unit in the store.
    pub fn all_units(&self) -> Result<Vec<AssetRecord>, LedgerError> {
        self.kv
            .prefix_scan(KeyPrefix::Asset.as_bytes())?
            .into_iter()
            .map(|(_, raw)| decode(&raw).map_err(LedgerError::from))
            .collect()
    }

    pub fn reservation(&self, key: &[u8]) -> Result<Option<Loaded<UnitHolder>>, LedgerError> {
        self.load(key)
    }

    // =========================================================================
    // ARCHIVE
    // =========================================================================

    pub fn archive(&self, id: &ArchiveId) -> Result<Option<Loaded<ArchiveRecord>>, LedgerError> {
        self.load(&KeyPrefix::archive_key(id))
    }

    pub fn archives(&self) -> Result<Vec<Loaded<ArchiveRecord>>, LedgerError> {
        self.kv
            .prefix_scan(&KeyPrefix::archive_prefix())?
            .into_iter()
            .map(|(_, raw)| {
                Ok(Loaded {
                    value: decode(&raw)?,
                    raw,
                })
            })
            .collect()
    }

    // =========================================================================
    // SUMMARIES
    // =========================================================================

    pub fn summary(&self, group: &GroupKey) -> Result<Option<Loaded<AggregateSummary>>, LedgerError> {
        self.load(&KeyPrefix::summary_key(group))
    }

    pub fn summaries(&self) -> Result<Vec<AggregateSummary>, LedgerError> {
        self.kv
            .prefix_scan(&KeyPrefix::summary_prefix())?
            .into_iter()
            .map(|(_, raw)| decode(&raw).map_err(LedgerError::from))
            .collect()
    }

    // =========================================================================
    // LEDGER
    // =========================================================================

    pub fn ledger_head(&self) -> Result<LedgerHead, LedgerError> {
        let raw = self.kv.get(&KeyPrefix::ledger_sequence_key())?;
        let last = match &raw {
            Some(bytes) => decode_sequence(bytes)?,
            None => 0,
        };
        Ok(LedgerHead { last, raw })
    }

    pub fn ledger_entry(
        &self,
        sequence: LedgerSequence,
    ) -> Result<Option<TransferLedgerEntry>, LedgerError> {
        Ok(self
            .load(&KeyPrefix::ledger_key(sequence))?
            .map(|loaded| loaded.value))
    }

    /// Entries indexed under `prefix`, newest first.
    pub fn history(&self, prefix: &[u8]) -> Result<Vec<TransferLedgerEntry>, LedgerError> {
        let mut entries = Vec::new();
        for (_, value) in self.kv.prefix_scan(prefix)?.into_iter().rev() {
            let sequence = decode_sequence(&value)?;
            if let Some(entry) = self.ledger_entry(sequence)? {
                entries.push(entry);
            }
        }
        Ok(entries)
    }

    // =========================================================================
    // WRITES
    // =========================================================================

    /// Commit a batch. `Ok(false)` means a guard failed and nothing was
    /// written; the caller re-reads and tries again.
    pub fn commit(&self, batch: WriteBatch) -> Result<bool, LedgerError> {
        match self.kv.atomic_batch_write(batch.finish()) {
            Ok(()) => Ok(true),
            Err(KVStoreError::ConditionFailed { .. }) => Ok(false),
            Err(e) => Err(e.into()),
        }
    }
}

fn decode_sequence(bytes: &[u8]) -> Result<LedgerSequence, LedgerError> {
    let array: [u8; 8] = bytes.try_into().map_err(|_| LedgerError::Persistence {
        message: format!("malformed ledger sequence ({} bytes)", bytes.len()),
    })?;
    Ok(u64::from_be_bytes(array))
}

/// One atomic unit of work.
///
/// Ledger entries appended here get consecutive sequence numbers after the
/// head they were read against; `finish` guards the counter so a batch
/// built on a stale head is rejected as a whole.
pub(crate) struct WriteBatch {
    ops: Vec<BatchOperation>,
    head: Option<LedgerHead>,
    appended: u64,
}

impl WriteBatch {
    pub fn new(head: LedgerHead) -> Self {
        Self {
            ops: Vec::new(),
            head: Some(head),
            appended: 0,
        }
    }

    /// A batch that will not append ledger entries.
    pub fn unsequenced() -> Self {
        Self {
            ops: Vec::new(),
            head: None,
            appended: 0,
        }
    }

    /// Write a unit that did not exist before (creation or restore).
    pub fn insert_asset(&mut self, record: &AssetRecord) -> Result<(), LedgerError> {
        let key = KeyPrefix::asset_key(&record.id);
        self.ops.push(BatchOperation::expect_absent(key.clone()));
        self.ops.push(BatchOperation::put(key, encode(record)?));
        self.index_asset(record)
    }

    /// Overwrite `previous` with `next`, failing if `previous` changed.
    pub fn replace_asset(
        &mut self,
        previous: &Loaded<AssetRecord>,
        next: &AssetRecord,
    ) -> Result<(), LedgerError> {
        let key = KeyPrefix::asset_key(&next.id);
        self.ops
            .push(BatchOperation::expect_value(key.clone(), previous.raw.clone()));
        if let Some(user) = previous.value.owner().user_id() {
            if next.owner().user_id() != Some(user) {
                self.ops
                    .push(BatchOperation::delete(KeyPrefix::owner_index_key(user, &next.id)));
            }
        }
        self.ops.push(BatchOperation::put(key, encode(next)?));
        self.index_asset(next)
    }

    /// Delete `previous` and its index entries, failing if it changed.
    pub fn remove_asset(&mut self, previous: &Loaded<AssetRecord>) {
        let record = &previous.value;
        let key = KeyPrefix::asset_key(&record.id);
        self.ops
            .push(BatchOperation::expect_value(key.clone(), previous.raw.clone()));
        self.ops.push(BatchOperation::delete(key));
        self.ops.push(BatchOperation::delete(KeyPrefix::group_index_key(
            &record.group(),
            &record.id,
        )));
        if let Some(user) = record.owner().user_id() {
            self.ops
                .push(BatchOperation::delete(KeyPrefix::owner_index_key(user, &record.id)));
        }
    }

    fn index_asset(&mut self, record: &AssetRecord) -> Result<(), LedgerError> {
        let id = encode(&record.id)?;
        self.ops.push(BatchOperation::put(
            KeyPrefix::group_index_key(&record.group(), &record.id),
            id.clone(),
        ));
        if let Some(user) = record.owner().user_id() {
            self.ops.push(BatchOperation::put(
                KeyPrefix::owner_index_key(user, &record.id),
                id,
            ));
        }
        Ok(())
    }

    /// Claim a serial/phone key that must currently be free.
    pub fn claim(&mut self, key: Vec<u8>, holder: UnitHolder) -> Result<(), LedgerError> {
        self.ops.push(BatchOperation::expect_absent(key.clone()));
        self.ops.push(BatchOperation::put(key, encode(&holder)?));
        Ok(())
    }

    /// Point an existing serial/phone key at a new holder.
    pub fn hand_over(&mut self, key: Vec<u8>, holder: UnitHolder) -> Result<(), LedgerError> {
        self.ops.push(BatchOperation::put(key, encode(&holder)?));
        Ok(())
    }

    /// Free a serial/phone key, failing if its holder changed.
    pub fn release(&mut self, key: Vec<u8>, observed: &Loaded<UnitHolder>) {
        self.ops
            .push(BatchOperation::expect_value(key.clone(), observed.raw.clone()));
        self.ops.push(BatchOperation::delete(key));
    }

    pub fn put_archive(&mut self, record: &ArchiveRecord) -> Result<(), LedgerError> {
        self.ops.push(BatchOperation::put(
            KeyPrefix::archive_key(&record.id),
            encode(record)?,
        ));
        Ok(())
    }

    /// Delete an archive record, failing if it changed or is already gone.
    pub fn remove_archive(&mut self, previous: &Loaded<ArchiveRecord>) {
        let key = KeyPrefix::archive_key(&previous.value.id);
        self.ops
            .push(BatchOperation::expect_value(key.clone(), previous.raw.clone()));
        self.ops.push(BatchOperation::delete(key));
    }

    /// Write a summary over the exact version that was read.
    pub fn put_summary(
        &mut self,
        previous: Option<&Loaded<AggregateSummary>>,
        summary: &AggregateSummary,
    ) -> Result<(), LedgerError> {
        let key = KeyPrefix::summary_key(&summary.group);
        self.ops.push(BatchOperation::expect(
            key.clone(),
            previous.map(|p| p.raw.clone()),
        ));
        self.ops.push(BatchOperation::put(key, encode(summary)?));
        Ok(())
    }

    /// Append a ledger entry. Returns its sequence number.
    pub fn append(&mut self, pending: PendingEntry) -> Result<LedgerSequence, LedgerError> {
        let head = self.head.as_ref().ok_or_else(|| LedgerError::Persistence {
            message: "ledger entry appended to an unsequenced batch".to_string(),
        })?;
        let sequence = head.last + self.appended + 1;
        self.appended += 1;
        let entry = pending.seal(sequence);
        let sequence_bytes = sequence.to_be_bytes().to_vec();

        self.ops.push(BatchOperation::put(
            KeyPrefix::ledger_key(sequence),
            encode(&entry)?,
        ));
        self.ops.push(BatchOperation::put(
            KeyPrefix::asset_history_key(&entry.asset_id, sequence),
            sequence_bytes.clone(),
        ));
        for user in entry.involved_users() {
            self.ops.push(BatchOperation::put(
                KeyPrefix::user_history_key(user, sequence),
                sequence_bytes.clone(),
            ));
        }
        Ok(sequence)
    }

    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }

    fn finish(mut self) -> Vec<BatchOperation> {
        if let Some(head) = self.head.take().filter(|_| self.appended > 0) {
            let key = KeyPrefix::ledger_sequence_key();
            let last = head.last + self.appended;
            self.ops.push(BatchOperation::expect(key.clone(), head.raw));
            self.ops
                .push(BatchOperation::put(key, last.to_be_bytes().to_vec()));
        }
        self.ops
    }
}
