use super::{apply_guarded, scan};
use crate::domain::errors::KVStoreError;
use crate::ports::outbound::{BatchOperation, KeyValueStore, ScanResult};
use parking_lot::RwLock;
use std::collections::BTreeMap;
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

type Entries = BTreeMap<Vec<u8>, Vec<u8>>;

/// File-backed key-value store.
///
/// Keeps the whole data set in memory and rewrites a single snapshot file
/// on every committed batch. Suitable for one process per data directory
/// (see `DataDirLock`).
///
/// File layout: `[key_len:u32][key][value_len:u32][value]...[crc32:u32]`,
/// little-endian, the trailer covering every preceding byte.
pub struct FileBackedKVStore {
    data: RwLock<Entries>,
    path: PathBuf,
}

impl FileBackedKVStore {
    /// Open the store at `path`, loading any existing snapshot.
    ///
    /// A missing file is an empty store. A truncated file or checksum
    /// mismatch is reported as corruption rather than silently dropped.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, KVStoreError> {
        let path = path.as_ref().to_path_buf();

        let data = match std::fs::read(&path) {
            Ok(bytes) => {
                let data = decode_snapshot(&bytes)?;
                info!(
                    path = %path.display(),
                    keys = data.len(),
                    bytes = bytes.len(),
                    "Loaded ledger snapshot"
                );
                data
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                info!(path = %path.display(), "No existing ledger snapshot");
                Entries::new()
            }
            Err(e) => return Err(io_error(e)),
        };

        Ok(Self {
            data: RwLock::new(data),
            path,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn save_to_file(&self, data: &Entries) -> Result<(), KVStoreError> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent).map_err(io_error)?;
        }

        let bytes = encode_snapshot(data);

        // Write atomically via temp file
        let temp_path = self.path.with_extension("tmp");
        let mut file = std::fs::File::create(&temp_path).map_err(io_error)?;
        file.write_all(&bytes).map_err(io_error)?;
        file.sync_all().map_err(io_error)?;
        std::fs::rename(&temp_path, &self.path).map_err(io_error)?;

        debug!(keys = data.len(), bytes = bytes.len(), "Snapshot written");
        Ok(())
    }
}

impl KeyValueStore for FileBackedKVStore {
    fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>, KVStoreError> {
        Ok(self.data.read().get(key).cloned())
    }

    fn atomic_batch_write(&self, operations: Vec<BatchOperation>) -> Result<(), KVStoreError> {
        let mut data = self.data.write();
        // Apply to a copy so a failed disk write leaves memory untouched.
        let mut next = data.clone();
        apply_guarded(&mut next, operations)?;
        self.save_to_file(&next)?;
        *data = next;
        Ok(())
    }

    fn exists(&self, key: &[u8]) -> Result<bool, KVStoreError> {
        Ok(self.data.read().contains_key(key))
    }

    fn prefix_scan(&self, prefix: &[u8]) -> Result<ScanResult, KVStoreError> {
        Ok(scan(&self.data.read(), prefix))
    }
}

fn io_error(e: std::io::Error) -> KVStoreError {
    KVStoreError::IOError {
        message: e.to_string(),
    }
}

fn encode_snapshot(data: &Entries) -> Vec<u8> {
    let mut bytes = Vec::new();
    for (key, value) in data {
        bytes.extend_from_slice(&(key.len() as u32).to_le_bytes());
        bytes.extend_from_slice(key);
        bytes.extend_from_slice(&(value.len() as u32).to_le_bytes());
        bytes.extend_from_slice(value);
    }
    let crc = crc32fast::hash(&bytes);
    bytes.extend_from_slice(&crc.to_le_bytes());
    bytes
}

fn decode_snapshot(bytes: &[u8]) -> Result<Entries, KVStoreError> {
    let corrupt = |message: &str| KVStoreError::CorruptionError {
        message: message.to_string(),
    };

    if bytes.len() < 4 {
        return Err(corrupt("snapshot shorter than its checksum"));
    }
    let (body, trailer) = bytes.split_at(bytes.len() - 4);
    let expected = u32::from_le_bytes([trailer[0], trailer[1], trailer[2], trailer[3]]);
    let actual = crc32fast::hash(body);
    if expected != actual {
        return Err(KVStoreError::CorruptionError {
            message: format!(
                "snapshot checksum mismatch: expected {:08x}, got {:08x}",
                expected, actual
            ),
        });
    }

    let mut data = Entries::new();
    let mut cursor = 0;
    while cursor < body.len() {
        let key = read_chunk(body, &mut cursor).ok_or_else(|| corrupt("truncated key"))?;
        let value = read_chunk(body, &mut cursor).ok_or_else(|| corrupt("truncated value"))?;
        data.insert(key.to_vec(), value.to_vec());
    }
    Ok(data)
}

fn read_chunk<'a>(body: &'a [u8], cursor: &mut usize) -> Option<&'a [u8]> {
    let len_bytes = body.get(*cursor..*cursor + 4)?;
    let len = u32::from_le_bytes(len_bytes.try_into().ok()?) as usize;
    *cursor += 4;
    let chunk = body.get(*cursor..*cursor + len)?;
    *cursor += len;
    Some(chunk)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_persists_across_reopen() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("ledger.db");

        {
            let store = FileBackedKVStore::open(&path).unwrap();
            store
                .atomic_batch_write(vec![
                    BatchOperation::put(b"a:1".to_vec(), b"one".to_vec()),
                    BatchOperation::put(b"a:2".to_vec(), Vec::new()),
                ])
                .unwrap();
        }

        let reopened = FileBackedKVStore::open(&path).unwrap();
        assert_eq!(reopened.get(b"a:1").unwrap(), Some(b"one".to_vec()));
        assert_eq!(reopened.get(b"a:2").unwrap(), Some(Vec::new()));
        assert_eq!(reopened.prefix_scan(b"a:").unwrap().len(), 2);
    }

    #[test]
    fn test_missing_file_is_empty_store() {
        let dir = tempdir().unwrap();
        let store = FileBackedKVStore::open(dir.path().join("absent.db")).unwrap();
        assert!(store.prefix_scan(b"").unwrap().is_empty());
    }

    #[test]
    fn test_corrupted_snapshot_is_rejected() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("ledger.db");
        {
            let store = FileBackedKVStore::open(&path).unwrap();
            store
                .atomic_batch_write(vec![BatchOperation::put(b"k".to_vec(), b"v".to_vec())])
                .unwrap();
        }

        let mut bytes = std::fs::read(&path).unwrap();
        bytes[4] ^= 0xFF;
        std::fs::write(&path, bytes).unwrap();

        assert!(matches!(
            FileBackedKVStore::open(&path),
            Err(KVStoreError::CorruptionError { .. })
        ));
    }

    #[test]
    fn test_failed_guard_does_not_touch_disk() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("ledger.db");
        let store = FileBackedKVStore::open(&path).unwrap();

        let result = store.atomic_batch_write(vec![
            BatchOperation::expect_value(b"k".to_vec(), b"v".to_vec()),
            BatchOperation::put(b"k".to_vec(), b"w".to_vec()),
        ]);

        assert!(matches!(result, Err(KVStoreError::ConditionFailed { .. })));
        assert!(!path.exists());
    }
}
