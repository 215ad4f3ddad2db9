//! # Service Container
//!
//! Holds the ledger service, the event bus and the data directory lock.
//!
//! ## Wiring
//!
//! 1. Lock the data directory (one process per ledger file)
//! 2. Open the file-backed store
//! 3. Create the event bus
//! 4. Build the ledger service and subscribe the bus adapter
//!
//! The lock is released when the container is dropped.

use asset_ledger::{
    AssetLedgerService, DataDirLock, FileBackedKVStore, InMemoryKVStore, KVStoreError,
    KeyValueStore, LedgerBusAdapter, LedgerDependencies, LockError, StaticCatalog,
    SystemTimeSource, TimeSource,
};
use shared_bus::{EventPublisher, InMemoryEventBus};
use std::sync::Arc;
use thiserror::Error;
use tracing::info;

use crate::container::config::{ConfigError, RuntimeConfig};

/// The ledger service as hosted by the runtime.
pub type RuntimeLedger<KV, TS = SystemTimeSource> = AssetLedgerService<KV, TS, StaticCatalog>;

/// Errors while assembling the container.
#[derive(Debug, Error)]
pub enum ContainerError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Lock(#[from] LockError),

    #[error("Failed to open ledger store: {0}")]
    Store(#[from] KVStoreError),
}

/// Central container holding the runtime's shared instances.
pub struct LedgerContainer<KV, TS = SystemTimeSource>
where
    KV: KeyValueStore + 'static,
    TS: TimeSource + 'static,
{
    /// The ledger service.
    pub ledger: Arc<RuntimeLedger<KV, TS>>,

    /// Event bus carrying committed mutations to collaborators.
    pub event_bus: Arc<InMemoryEventBus>,

    /// Runtime configuration (immutable after initialization).
    pub config: RuntimeConfig,

    /// Held for the container's lifetime.
    _lock: Option<DataDirLock>,
}

impl LedgerContainer<FileBackedKVStore> {
    /// Lock `config.data_dir` and open the ledger file inside it.
    pub fn open(config: RuntimeConfig) -> Result<Self, ContainerError> {
        config.validate()?;
        let lock = DataDirLock::acquire(&config.data_dir)?;
        let store = FileBackedKVStore::open(config.ledger_path())?;
        info!(data_dir = %config.data_dir.display(), "Opened ledger store");
        Ok(Self::assemble(config, store, SystemTimeSource, Some(lock)))
    }
}

impl<TS> LedgerContainer<InMemoryKVStore, TS>
where
    TS: TimeSource + 'static,
{
    /// A container over a throwaway in-memory store.
    pub fn in_memory(config: RuntimeConfig, time_source: TS) -> Self {
        Self::assemble(config, InMemoryKVStore::new(), time_source, None)
    }
}

impl<KV, TS> LedgerContainer<KV, TS>
where
    KV: KeyValueStore + 'static,
    TS: TimeSource + 'static,
{
    fn assemble(config: RuntimeConfig, kv_store: KV, time_source: TS, lock: Option<DataDirLock>) -> Self {
        let event_bus = Arc::new(InMemoryEventBus::new());

        let ledger = AssetLedgerService::new(
            LedgerDependencies {
                kv_store,
                time_source,
                catalog: StaticCatalog::default(),
            },
            config.ledger.clone(),
        );
        let publisher: Arc<dyn EventPublisher> = event_bus.clone();
        ledger.subscribe(Arc::new(LedgerBusAdapter::new(publisher)));
        info!(
            retention_secs = config.ledger.retention_secs,
            purge_interval_secs = config.purge_interval_secs,
            "Ledger service wired to event bus"
        );

        Self {
            ledger: Arc::new(ledger),
            event_bus,
            config,
            _lock: lock,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use asset_ledger::test_utils::MockTimeSource;
    use asset_ledger::{AssetLedgerApi, NewUnit};
    use shared_bus::{EventFilter, InventoryEvent};

    #[test]
    fn test_in_memory_container_publishes_mutations() {
        let container = LedgerContainer::in_memory(RuntimeConfig::default(), MockTimeSource::default());
        let mut sub = container.event_bus.subscribe(EventFilter::all());

        container
            .ledger
            .create_unit(NewUnit::admin_stock("Mouse", "accessories"))
            .unwrap();

        assert!(matches!(
            sub.try_recv(),
            Ok(Some(InventoryEvent::UnitCreated { .. }))
        ));
        assert!(matches!(
            sub.try_recv(),
            Ok(Some(InventoryEvent::SummaryRecomputed { total: 1, .. }))
        ));
    }

    #[test]
    fn test_open_locks_data_dir() {
        let dir = tempfile::tempdir().unwrap();
        let config = RuntimeConfig {
            data_dir: dir.path().to_path_buf(),
            ..RuntimeConfig::default()
        };

        let first = LedgerContainer::open(config.clone()).unwrap();
        assert!(matches!(
            LedgerContainer::open(config.clone()),
            Err(ContainerError::Lock(LockError::AlreadyLocked { .. }))
        ));

        drop(first);
        assert!(LedgerContainer::open(config).is_ok());
    }

    #[test]
    fn test_open_rejects_invalid_config() {
        let config = RuntimeConfig {
            purge_interval_secs: 0,
            ..RuntimeConfig::default()
        };
        assert!(matches!(
            LedgerContainer::open(config),
            Err(ContainerError::Config(ConfigError::ZeroPurgeInterval))
        ));
    }
}
