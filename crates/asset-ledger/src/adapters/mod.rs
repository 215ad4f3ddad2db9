//! # Adapters Module
//!
//! Implementations of the outbound ports.
//!
//! ## Modules
//!
//! - `storage`: in-memory and file-backed `KeyValueStore`s
//! - `clock`: system clock
//! - `serializer`: bincode encoding of stored values
//! - `catalog`: static status/condition/category catalog
//! - `lock`: one-process lock on the data directory (feature `locking`)

pub mod catalog;
pub mod clock;
#[cfg(feature = "locking")]
pub mod lock;
pub mod serializer;
pub mod storage;

pub use catalog::{CatalogConfig, StaticCatalog};
pub use clock::SystemTimeSource;
#[cfg(feature = "locking")]
pub use lock::{DataDirLock, LockError};
pub use storage::{FileBackedKVStore, InMemoryKVStore};
