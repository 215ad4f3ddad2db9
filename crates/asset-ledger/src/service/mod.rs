//! # Asset Ledger Service
//!
//! The main service implementing [`AssetLedgerApi`].
//!
//! ## Architecture
//!
//! This service:
//! 1. Validates every request before reading shared state
//! 2. Assembles each mutation into one guarded batch (record, indexes,
//!    ledger entries, sequence counter) and retries on write conflicts
//! 3. Dispatches one [`LedgerEvent`] per committed mutation; the
//!    [`AggregateProjector`] keeps group summaries in step
//! 4. Uses dependency injection for storage, time and the status catalog
//!
//! Nothing is cached in the service. Several instances may share one
//! store; the store's batch guards are what keep them consistent.

mod api;
mod archive;
mod dispatch;
mod helpers;
mod projector;
mod records;
mod stock;
mod store;
mod transfer;

pub use dispatch::EventDispatcher;
pub use projector::AggregateProjector;

use crate::domain::asset::AssetRecord;
use crate::domain::errors::LedgerError;
use crate::domain::events::LedgerEvent;
use crate::domain::projection::RecomputeMode;
use crate::domain::value_objects::LedgerConfig;
use crate::ports::inbound::AssetLedgerApi;
use crate::ports::outbound::{KeyValueStore, LedgerEventHandler, StatusCatalog, TimeSource};
use std::sync::Arc;
use store::{Loaded, RecordStore, WriteBatch};

/// The Asset Ledger Service.
pub struct AssetLedgerService<KV, TS, CAT>
where
    KV: KeyValueStore + 'static,
    TS: TimeSource + 'static,
    CAT: StatusCatalog,
{
    /// Typed access to the key-value store.
    pub(crate) store: RecordStore<KV>,
    /// Time source for timestamps and retention deadlines.
    pub(crate) time_source: Arc<TS>,
    /// Categories, statuses and conditions.
    pub(crate) catalog: CAT,
    /// Service configuration.
    pub(crate) config: LedgerConfig,
    /// Keeps group summaries current. Also registered with `dispatcher`.
    pub(crate) projector: Arc<AggregateProjector<KV, TS>>,
    /// Delivers committed events to handlers.
    pub(crate) dispatcher: EventDispatcher,
}

/// Dependencies for AssetLedgerService
pub struct LedgerDependencies<KV, TS, CAT> {
    pub kv_store: KV,
    pub time_source: TS,
    pub catalog: CAT,
}

impl<KV, TS, CAT> AssetLedgerService<KV, TS, CAT>
where
    KV: KeyValueStore + 'static,
    TS: TimeSource + 'static,
    CAT: StatusCatalog,
{
    /// Create a new Asset Ledger Service with the given dependencies.
    ///
    /// The summary projector is subscribed before anything else, so it is
    /// always the first handler to see an event.
    pub fn new(deps: LedgerDependencies<KV, TS, CAT>, config: LedgerConfig) -> Self {
        let store = RecordStore::new(Arc::new(deps.kv_store));
        let time_source = Arc::new(deps.time_source);
        let projector = Arc::new(AggregateProjector::new(
            store.clone(),
            Arc::clone(&time_source),
            config.max_write_retries,
        ));

        let dispatcher = EventDispatcher::new();
        dispatcher.subscribe(projector.clone());

        Self {
            store,
            time_source,
            catalog: deps.catalog,
            config,
            projector,
            dispatcher,
        }
    }

    /// Register a handler for committed ledger events.
    pub fn subscribe(&self, handler: Arc<dyn LedgerEventHandler>) {
        self.dispatcher.subscribe(handler);
    }

    #[must_use]
    pub fn config(&self) -> &LedgerConfig {
        &self.config
    }

    /// The underlying key-value store.
    pub fn kv_store(&self) -> &KV {
        self.store.kv()
    }

    /// The summary projector.
    pub fn projector(&self) -> &Arc<AggregateProjector<KV, TS>> {
        &self.projector
    }
}
