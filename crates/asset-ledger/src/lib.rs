//! # Asset Ownership Ledger
//!
//! Tracks individually identifiable physical units (computers, mice, SIM
//! cards), who holds each of them, an append-only trail of every ownership
//! and status change, per-group aggregate counts, and a soft-delete archive
//! with a retention window.
//!
//! ## Architecture (Event-Driven Projection)
//!
//! Every mutation commits as one guarded batch and then emits exactly one
//! ledger event. A single handler, the aggregate projector, turns events
//! into summary recomputes:
//!
//! ```text
//! create / transfer / status ─┐
//! delete / restore / purge ───┼──→ [Guarded Batch] ──→ LedgerEvent
//! set / adjust / sync stock ──┘    record + indexes         │
//!                                  + ledger entries         ├──→ AggregateProjector ──→ SummaryRecomputed
//!                                  + sequence bump          └──→ LedgerBusAdapter ──→ [Event Bus]
//! ```
//!
//! ## Domain Invariants
//!
//! | ID | Invariant | Description |
//! |----|-----------|-------------|
//! | 1 | Owner Shape | `admin_stock` never names a user; `user_owned` always does |
//! | 2 | Audited Mutation | Every ownership/status change commits with its ledger entry |
//! | 3 | Balanced Summary | `available + user_owned == total` for every group |
//! | 4 | Unique Serial/Phone | Across live units and unrestored archive records |
//! | 5 | Single Restore | Archive records restore once, before their deadline |
//! | 6 | Stable Recompute | Recomputing twice without a mutation changes nothing |
//! | 7 | Safe Shrink | Stock shrinks remove only available, working pool units |
//! | 8 | Compare-and-Swap | A transfer applies only if the owner is still the expected one |
//!
//! ## Crate Structure (Hexagonal Architecture)
//!
//! - `domain/` - Records, ledger entries, summaries, pure projection and planning
//! - `ports/` - Port traits (inbound API, outbound SPI)
//! - `adapters/` - Key-value stores, catalog, clock, serializer, data-dir lock
//! - `service/` - Application service implementing the API
//! - `bus/` - Event bus adapter publishing to `shared-bus`
//!
//! ## Usage
//!
//! ```ignore
//! use asset_ledger::{
//!     AssetLedgerApi, AssetLedgerService, InMemoryKVStore, LedgerConfig,
//!     LedgerDependencies, NewUnit, StaticCatalog, SystemTimeSource,
//! };
//!
//! let ledger = AssetLedgerService::new(
//!     LedgerDependencies {
//!         kv_store: InMemoryKVStore::new(),
//!         time_source: SystemTimeSource,
//!         catalog: StaticCatalog::default(),
//!     },
//!     LedgerConfig::default(),
//! );
//!
//! let laptop = ledger.create_unit(
//!     NewUnit::admin_stock("Laptop", "computers").with_serial("SN-100"),
//! )?;
//! ```

// Allow in tests
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

pub mod adapters;
#[cfg(feature = "bus")]
pub mod bus;
pub mod domain;
pub mod ports;
pub mod service;
#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;

// Re-export key types for convenience
pub use adapters::{
    CatalogConfig, FileBackedKVStore, InMemoryKVStore, StaticCatalog, SystemTimeSource,
};
#[cfg(feature = "locking")]
pub use adapters::{DataDirLock, LockError};
pub use domain::archive::{ArchiveRecord, DeleteRequest};
pub use domain::asset::{AddedBy, AssetRecord, NewUnit, OwnerRef, Ownership};
pub use domain::errors::{KVStoreError, LedgerError, UnitHolder};
pub use domain::events::LedgerEvent;
pub use domain::ledger::{
    LedgerOwnerType, OwnershipSnapshot, TransferContext, TransferLedgerEntry,
};
pub use domain::projection::RecomputeMode;
pub use domain::summary::{AggregateSummary, StockOperation, StockOperationKind};
pub use domain::value_objects::{KeyPrefix, LedgerConfig};
pub use ports::inbound::{AssetLedgerApi, HistoryQuery, StatusChangeRequest, TransferRequest};
pub use ports::outbound::{
    BatchOperation, KeyValueStore, LedgerEventHandler, StatusCatalog, TimeSource,
};
pub use service::{AggregateProjector, AssetLedgerService, EventDispatcher, LedgerDependencies};

// Re-export Bus types
#[cfg(feature = "bus")]
pub use bus::LedgerBusAdapter;
