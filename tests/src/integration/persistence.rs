//! # Persistence Across Restarts
//!
//! A ledger reopened from its data directory must carry on exactly where
//! the previous process stopped: same units, same archive, same history,
//! and ledger sequence numbers that keep counting up.

#[cfg(test)]
mod tests {
    use asset_ledger::test_utils::MockTimeSource;
    use asset_ledger::{
        AssetLedgerApi, AssetLedgerService, DeleteRequest, FileBackedKVStore, HistoryQuery,
        LedgerConfig, LedgerDependencies, LedgerError, NewUnit, OwnerRef, StaticCatalog,
        TransferRequest, UnitHolder,
    };
    use ledger_runtime::{ContainerError, LedgerContainer, RuntimeConfig};
    use shared_types::{GroupKey, TransferType};
    use std::path::Path;

    type FileLedger = AssetLedgerService<FileBackedKVStore, MockTimeSource, StaticCatalog>;

    fn open(path: &Path, clock: &MockTimeSource) -> FileLedger {
        AssetLedgerService::new(
            LedgerDependencies {
                kv_store: FileBackedKVStore::open(path).unwrap(),
                time_source: clock.clone(),
                catalog: StaticCatalog::default(),
            },
            LedgerConfig::default(),
        )
    }

    #[test]
    fn test_state_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ledger.db");
        let clock = MockTimeSource::default();

        let (kept, archived) = {
            let ledger = open(&path, &clock);
            let kept = ledger
                .create_unit(NewUnit::admin_stock("Laptop", "computers").with_serial("SN-1"))
                .unwrap();
            ledger
                .transfer_unit(TransferRequest::new(
                    kept.id,
                    OwnerRef::admin_stock(),
                    OwnerRef::user("U1"),
                    TransferType::RequestApproved,
                    "A1",
                ))
                .unwrap();
            let gone = ledger
                .create_unit(NewUnit::admin_stock("Laptop", "computers").with_serial("SN-2"))
                .unwrap();
            let archived = ledger
                .delete_unit(gone.id, DeleteRequest::individual("damaged", "A1", "Admin One"))
                .unwrap();
            (kept, archived)
        };

        let ledger = open(&path, &clock);

        assert_eq!(ledger.get_unit(kept.id).unwrap().owner(), &OwnerRef::user("U1"));
        assert_eq!(ledger.list_archive().unwrap(), vec![archived.clone()]);
        assert_eq!(
            ledger.query_group_summary(&GroupKey::new("Laptop", "computers")).unwrap().total_quantity,
            1
        );
        assert!(matches!(
            ledger.create_unit(NewUnit::admin_stock("Laptop", "computers").with_serial("SN-2")),
            Err(LedgerError::DuplicateSerial { holder: UnitHolder::Archived(id), .. }) if id == archived.id
        ));

        let before = ledger.query_history(HistoryQuery::Asset(kept.id)).unwrap();
        ledger
            .transfer_unit(TransferRequest::new(
                kept.id,
                OwnerRef::user("U1"),
                OwnerRef::admin_stock(),
                TransferType::ReturnCompleted,
                "A1",
            ))
            .unwrap();
        let after = ledger.query_history(HistoryQuery::Asset(kept.id)).unwrap();
        assert_eq!(after.len(), before.len() + 1);
        // Two creations and one transfer came before; archiving is not a transfer.
        assert_eq!(after[0].sequence, 4);
        assert!(after[0].sequence > before[0].sequence);
    }

    #[test]
    fn test_container_reopens_data_dir() {
        let dir = tempfile::tempdir().unwrap();
        let config = RuntimeConfig {
            data_dir: dir.path().to_path_buf(),
            ..RuntimeConfig::default()
        };

        let id = {
            let container = LedgerContainer::open(config.clone()).unwrap();
            container
                .ledger
                .create_unit(NewUnit::admin_stock("SIM card", "telecom").with_phone("0711111111"))
                .unwrap()
                .id
        };

        let container = LedgerContainer::open(config).unwrap();
        let found = container.ledger.find_by_phone("0711111111").unwrap().unwrap();
        assert_eq!(found.id, id);
    }

    #[test]
    fn test_corrupt_store_is_refused() {
        let dir = tempfile::tempdir().unwrap();
        let config = RuntimeConfig {
            data_dir: dir.path().to_path_buf(),
            ..RuntimeConfig::default()
        };
        std::fs::write(config.ledger_path(), b"definitely not a ledger snapshot").unwrap();

        assert!(matches!(
            LedgerContainer::open(config),
            Err(ContainerError::Store(_))
        ));
    }
}
