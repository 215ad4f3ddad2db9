//! Storage Adapters
//!
//! Implementations of the `KeyValueStore` trait.

mod file;
mod memory;

pub use file::FileBackedKVStore;
pub use memory::InMemoryKVStore;

use crate::domain::errors::KVStoreError;
use crate::ports::outbound::BatchOperation;
use std::collections::BTreeMap;

/// Check every guard, then apply every write.
///
/// Callers hold their write lock across this call, which is what makes the
/// batch indivisible.
pub(crate) fn apply_guarded(
    data: &mut BTreeMap<Vec<u8>, Vec<u8>>,
    operations: Vec<BatchOperation>,
) -> Result<(), KVStoreError> {
    for op in &operations {
        let failed = match op {
            BatchOperation::ExpectValue { key, value } if data.get(key) != Some(value) => Some(key),
            BatchOperation::ExpectAbsent { key } if data.contains_key(key) => Some(key),
            _ => None,
        };
        if let Some(key) = failed {
            return Err(KVStoreError::ConditionFailed { key: key.clone() });
        }
    }

    for op in operations {
        match op {
            BatchOperation::Put { key, value } => {
                data.insert(key, value);
            }
            BatchOperation::Delete { key } => {
                data.remove(&key);
            }
            BatchOperation::ExpectValue { .. } | BatchOperation::ExpectAbsent { .. } => {}
        }
    }
    Ok(())
}

pub(crate) fn scan(data: &BTreeMap<Vec<u8>, Vec<u8>>, prefix: &[u8]) -> Vec<(Vec<u8>, Vec<u8>)> {
    data.range(prefix.to_vec()..)
        .take_while(|(k, _)| k.starts_with(prefix))
        .map(|(k, v)| (k.clone(), v.clone()))
        .collect()
}
