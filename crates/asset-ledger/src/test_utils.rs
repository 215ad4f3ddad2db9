//! Shared fixtures for unit tests and the workspace integration tests.

use crate::adapters::{InMemoryKVStore, StaticCatalog};
use crate::domain::asset::{AcquisitionMethod, AddedBy, AssetRecord, OwnerRef, Ownership, SourceInfo};
use crate::domain::value_objects::LedgerConfig;
use crate::ports::outbound::TimeSource;
use crate::service::{AssetLedgerService, LedgerDependencies};
use shared_types::{AssetId, OwnerType, Timestamp};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Clock start used by the fixtures: 2024-01-01T00:00:00Z.
pub const T0: Timestamp = 1_704_067_200;

/// Manually driven clock. Clones share the same time.
#[derive(Debug, Clone)]
pub struct MockTimeSource {
    now: Arc<AtomicU64>,
}

impl MockTimeSource {
    pub fn new(start: Timestamp) -> Self {
        Self {
            now: Arc::new(AtomicU64::new(start)),
        }
    }

    pub fn advance(&self, secs: u64) {
        self.now.fetch_add(secs, Ordering::SeqCst);
    }

    pub fn set(&self, at: Timestamp) {
        self.now.store(at, Ordering::SeqCst);
    }
}

impl Default for MockTimeSource {
    fn default() -> Self {
        Self::new(T0)
    }
}

impl TimeSource for MockTimeSource {
    fn now(&self) -> Timestamp {
        self.now.load(Ordering::SeqCst)
    }
}

/// Service over an in-memory store with the default catalog.
pub type TestLedger = AssetLedgerService<InMemoryKVStore, MockTimeSource, StaticCatalog>;

/// A fresh ledger and a handle on its clock.
pub fn make_test_service() -> (TestLedger, MockTimeSource) {
    make_test_service_with(LedgerConfig::default())
}

pub fn make_test_service_with(config: LedgerConfig) -> (TestLedger, MockTimeSource) {
    let clock = MockTimeSource::default();
    let deps = LedgerDependencies {
        kv_store: InMemoryKVStore::new(),
        time_source: clock.clone(),
        catalog: StaticCatalog::default(),
    };
    (AssetLedgerService::new(deps, config), clock)
}

/// An admin-added, admin-held unit that is available and working.
pub fn sample_record(item_name: &str, category_id: &str) -> AssetRecord {
    AssetRecord {
        id: AssetId::new(),
        item_name: item_name.to_string(),
        category_id: category_id.into(),
        serial_number: None,
        phone_number: None,
        status_id: "available".into(),
        condition_id: "working".into(),
        ownership: Ownership::new(OwnerRef::admin_stock(), T0, None),
        source_info: SourceInfo {
            added_by: AddedBy::Admin,
            added_by_user_id: Some("A1".into()),
            date_added: T0,
            initial_owner_type: OwnerType::AdminStock,
            acquisition_method: AcquisitionMethod::BulkAdd,
            notes: None,
        },
        transfer_info: None,
    }
}
