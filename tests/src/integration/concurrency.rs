//! # Concurrency Races
//!
//! Several writers hammer one ledger from plain threads. Whatever the
//! interleaving, ownership stays unique, every committed change has exactly
//! one ledger entry and the group summary matches the units.

#[cfg(test)]
mod tests {
    use std::collections::HashSet;
    use std::sync::Arc;
    use std::thread;

    use asset_ledger::test_utils::{make_test_service_with, MockTimeSource, TestLedger};
    use asset_ledger::{
        AssetLedgerApi, DeleteRequest, HistoryQuery, LedgerConfig, LedgerError, LedgerOwnerType,
        NewUnit, OwnerRef, TransferRequest,
    };
    use shared_types::{AssetId, GroupKey, TransferType};

    const THREADS: usize = 8;

    /// Every batch is guarded on the ledger sequence, so racing writers on
    /// unrelated units still collide. Give them room to retry.
    fn contended() -> (TestLedger, MockTimeSource) {
        make_test_service_with(LedgerConfig::default().with_max_write_retries(256))
    }

    fn mouse() -> GroupKey {
        GroupKey::new("Mouse", "accessories")
    }

    fn stock(ledger: &TestLedger, count: usize) -> Vec<AssetId> {
        (0..count)
            .map(|_| {
                ledger
                    .create_unit(NewUnit::admin_stock("Mouse", "accessories").added_by_admin("A1"))
                    .unwrap()
                    .id
            })
            .collect()
    }

    fn claim(ledger: &TestLedger, id: AssetId, user: &str) -> Result<(), LedgerError> {
        ledger
            .transfer_unit(TransferRequest::new(
                id,
                OwnerRef::admin_stock(),
                OwnerRef::user(user),
                TransferType::RequestApproved,
                "A1",
            ))
            .map(|_| ())
    }

    #[test]
    fn test_each_unit_is_claimed_once() {
        let (ledger, _) = contended();
        let ids = stock(&ledger, 20);
        let ledger = Arc::new(ledger);

        let handles: Vec<_> = (0..THREADS)
            .map(|n| {
                let ledger = Arc::clone(&ledger);
                let ids = ids.clone();
                thread::spawn(move || {
                    let user = format!("U{}", n);
                    ids.iter()
                        .filter(|id| claim(&ledger, **id, &user).is_ok())
                        .count()
                })
            })
            .collect();
        let claimed: usize = handles.into_iter().map(|h| h.join().unwrap()).sum();

        assert_eq!(claimed, ids.len());
        for id in &ids {
            let history = ledger.query_history(HistoryQuery::Asset(*id)).unwrap();
            assert_eq!(history.len(), 2, "unit {} has a double claim", id);
            assert_eq!(history[0].to_ownership.user_id.as_ref(), ledger.get_unit(*id).unwrap().owner().user_id());
        }
        let summary = ledger.query_group_summary(&mouse()).unwrap();
        assert_eq!((summary.total_quantity, summary.user_owned_quantity), (20, 20));
        assert!(summary.is_balanced());
    }

    #[test]
    fn test_shrink_racing_claims_never_loses_a_unit() {
        let (ledger, _) = contended();
        let sims = GroupKey::new("SIM card", "telecom");
        ledger
            .sync_admin_stock_units(&sims, 12, "delivery", &"A1".into())
            .unwrap();
        let ids: Vec<AssetId> = ledger
            .query_available(&sims, 100)
            .unwrap()
            .iter()
            .map(|u| u.id)
            .collect();
        let ledger = Arc::new(ledger);

        let shrinker = {
            let ledger = Arc::clone(&ledger);
            let sims = sims.clone();
            thread::spawn(move || ledger.sync_admin_stock_units(&sims, 0, "write-off", &"A1".into()))
        };
        let claimers: Vec<_> = (0..4)
            .map(|n| {
                let ledger = Arc::clone(&ledger);
                let ids = ids.clone();
                thread::spawn(move || {
                    for id in ids.iter().skip(n).step_by(4) {
                        match claim(&ledger, *id, &format!("U{}", n)) {
                            Ok(()) | Err(LedgerError::NotFound { .. }) => {}
                            Err(e) => panic!("unexpected claim failure: {}", e),
                        }
                    }
                })
            })
            .collect();
        for claimer in claimers {
            claimer.join().unwrap();
        }
        shrinker.join().unwrap().unwrap();

        for id in &ids {
            let history = ledger.query_history(HistoryQuery::Asset(*id)).unwrap();
            assert_eq!(history.len(), 2);
            match ledger.get_unit(*id) {
                Ok(unit) => {
                    assert!(!unit.owner().is_admin_stock());
                    assert_eq!(history[0].transfer_type, TransferType::RequestApproved);
                }
                Err(LedgerError::NotFound { .. }) => {
                    assert_eq!(history[0].to_ownership.owner_type, LedgerOwnerType::Removed);
                }
                Err(e) => panic!("unexpected read failure: {}", e),
            }
        }
        let summary = ledger.query_group_summary(&sims).unwrap();
        assert_eq!(summary.available_quantity, 0);
        assert!(summary.is_balanced());
    }

    #[test]
    fn test_racing_restores_have_one_winner() {
        let (ledger, _) = contended();
        let id = stock(&ledger, 1)[0];
        let archived = ledger
            .delete_unit(id, DeleteRequest::individual("damaged", "A1", "Admin One"))
            .unwrap();
        let ledger = Arc::new(ledger);

        let results: Vec<_> = (0..THREADS)
            .map(|_| {
                let ledger = Arc::clone(&ledger);
                thread::spawn(move || ledger.restore_unit(archived.id, &"A1".into()))
            })
            .collect::<Vec<_>>()
            .into_iter()
            .map(|h| h.join().unwrap())
            .collect();

        assert_eq!(results.iter().filter(|r| r.is_ok()).count(), 1);
        assert!(results
            .iter()
            .filter_map(|r| r.as_ref().err())
            .all(|e| matches!(e, LedgerError::NotFound { .. })));
        assert_eq!(ledger.query_group_summary(&mouse()).unwrap().total_quantity, 1);
    }

    #[test]
    fn test_phone_is_unique_across_categories() {
        let (ledger, _) = contended();
        let ledger = Arc::new(ledger);

        let results: Vec<_> = (0..THREADS)
            .map(|n| {
                let ledger = Arc::clone(&ledger);
                let category = if n % 2 == 0 { "telecom" } else { "mobile" };
                thread::spawn(move || {
                    ledger.create_unit(
                        NewUnit::admin_stock("SIM card", category).with_phone("0700000001"),
                    )
                })
            })
            .collect::<Vec<_>>()
            .into_iter()
            .map(|h| h.join().unwrap())
            .collect();

        assert_eq!(results.iter().filter(|r| r.is_ok()).count(), 1);
        assert!(results
            .iter()
            .filter_map(|r| r.as_ref().err())
            .all(|e| matches!(e, LedgerError::DuplicatePhone { .. })));
    }

    #[test]
    fn test_parallel_creates_keep_summary_exact() {
        let (ledger, _) = contended();
        let ledger = Arc::new(ledger);

        let created: Vec<AssetId> = (0..THREADS)
            .map(|_| {
                let ledger = Arc::clone(&ledger);
                thread::spawn(move || stock(&ledger, 5))
            })
            .collect::<Vec<_>>()
            .into_iter()
            .flat_map(|h| h.join().unwrap())
            .collect();

        assert_eq!(created.iter().collect::<HashSet<_>>().len(), THREADS * 5);
        let summary = ledger.query_group_summary(&mouse()).unwrap();
        assert_eq!(summary.total_quantity, (THREADS * 5) as u64);
        assert_eq!(summary.admin_defined_stock(), (THREADS * 5) as u64);
    }
}
