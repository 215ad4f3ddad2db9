//! # Integration Test Flows
//!
//! Drives the ledger through the runtime container and checks what
//! collaborators see on the shared bus.
//!
//! ## Flows Tested
//!
//! 1. **Unit lifecycle**: create → transfer → archive → restore, one bus
//!    event per mutation followed by the recomputed summary
//! 2. **Stock shrink**: a sync that removes units announces the removal
//! 3. **Retention**: the purge sweep destroys expired archive records
//! 4. **Audit log**: every published event is logged

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use asset_ledger::test_utils::MockTimeSource;
    use asset_ledger::{
        AssetLedgerApi, DeleteRequest, HistoryQuery, InMemoryKVStore, NewUnit, OwnerRef,
        TransferContext, TransferRequest,
    };
    use ledger_runtime::tasks::{run_audit_log, sweep_once};
    use ledger_runtime::{LedgerContainer, RuntimeConfig};
    use shared_bus::{EventFilter, EventTopic, InventoryEvent, Subscription};
    use shared_types::{GroupKey, OwnerType, TransferType, UserId, SECONDS_PER_DAY};
    use tokio::sync::watch;

    // =========================================================================
    // TEST FIXTURES
    // =========================================================================

    type Container = LedgerContainer<InMemoryKVStore, MockTimeSource>;

    fn container() -> (Container, MockTimeSource) {
        let clock = MockTimeSource::default();
        (
            LedgerContainer::in_memory(RuntimeConfig::default(), clock.clone()),
            clock,
        )
    }

    fn drain(sub: &mut Subscription) -> Vec<InventoryEvent> {
        let mut events = Vec::new();
        while let Ok(Some(event)) = sub.try_recv() {
            events.push(event);
        }
        events
    }

    fn recomputed(events: &[InventoryEvent]) -> Option<(u64, u64, u64)> {
        events.iter().rev().find_map(|e| match e {
            InventoryEvent::SummaryRecomputed {
                total,
                available,
                user_owned,
                ..
            } => Some((*total, *available, *user_owned)),
            _ => None,
        })
    }

    // =========================================================================
    // FLOWS
    // =========================================================================

    #[test]
    fn test_unit_lifecycle_on_the_bus() {
        let (container, _) = container();
        let ledger = Arc::clone(&container.ledger);
        let mut sub = container.event_bus.subscribe(EventFilter::all());

        let mice: Vec<_> = (0..3)
            .map(|_| {
                ledger
                    .create_unit(NewUnit::admin_stock("Mouse", "accessories").added_by_admin("A1"))
                    .unwrap()
            })
            .collect();
        let events = drain(&mut sub);
        assert_eq!(events.len(), 6);
        assert_eq!(recomputed(&events), Some((3, 3, 0)));

        ledger
            .transfer_unit(
                TransferRequest::new(
                    mice[0].id,
                    OwnerRef::admin_stock(),
                    OwnerRef::user("U1"),
                    TransferType::RequestApproved,
                    "A1",
                )
                .with_context(TransferContext::default().request("REQ-7")),
            )
            .unwrap();
        let events = drain(&mut sub);
        assert!(matches!(
            &events[0],
            InventoryEvent::UnitTransferred {
                from_owner: OwnerType::AdminStock,
                to_owner: OwnerType::UserOwned,
                to_user: Some(user),
                transfer_type: TransferType::RequestApproved,
                ..
            } if user == &UserId::from("U1")
        ));
        assert_eq!(recomputed(&events), Some((3, 2, 1)));

        let archived = ledger
            .delete_unit(mice[1].id, DeleteRequest::individual("damaged", "A1", "Admin One"))
            .unwrap();
        let events = drain(&mut sub);
        assert!(matches!(&events[0], InventoryEvent::UnitArchived { archive_id, .. } if *archive_id == archived.id));
        assert_eq!(recomputed(&events), Some((2, 1, 1)));

        ledger.restore_unit(archived.id, &"A1".into()).unwrap();
        let events = drain(&mut sub);
        assert!(matches!(&events[0], InventoryEvent::UnitRestored { asset_id, .. } if *asset_id == mice[1].id));
        assert_eq!(recomputed(&events), Some((3, 2, 1)));
    }

    #[test]
    fn test_stock_shrink_announces_removed_units() {
        let (container, _) = container();
        let ledger = Arc::clone(&container.ledger);
        let sims = GroupKey::new("SIM card", "telecom");
        ledger
            .sync_admin_stock_units(&sims, 3, "delivery", &"A1".into())
            .unwrap();
        let mut sub = container
            .event_bus
            .subscribe(EventFilter::topics(vec![EventTopic::Stock]));

        ledger
            .sync_admin_stock_units(&sims, 1, "recount", &"A1".into())
            .unwrap();

        let events = drain(&mut sub);
        assert_eq!(events.len(), 2);
        assert!(matches!(
            &events[0],
            InventoryEvent::StockLevelChanged {
                previous: 3,
                new: 1,
                ..
            }
        ));
        let InventoryEvent::UnitsRemoved { asset_ids, .. } = &events[1] else {
            panic!("expected UnitsRemoved, got {:?}", events[1]);
        };
        assert_eq!(asset_ids.len(), 2);
        for id in asset_ids {
            assert!(ledger.get_unit(*id).is_err());
        }
    }

    #[tokio::test]
    async fn test_retention_sweep_purges_expired_records() {
        let (container, clock) = container();
        let ledger = Arc::clone(&container.ledger);
        let unit = ledger
            .create_unit(NewUnit::admin_stock("Laptop", "computers").with_serial("SN-42"))
            .unwrap();
        let archived = ledger
            .delete_unit(unit.id, DeleteRequest::individual("stolen", "A1", "Admin One"))
            .unwrap();
        let mut sub = container
            .event_bus
            .subscribe(EventFilter::topics(vec![EventTopic::Archive]));

        clock.advance(29 * SECONDS_PER_DAY);
        assert_eq!(sweep_once(Arc::clone(&ledger)).await.unwrap(), 0);

        clock.advance(SECONDS_PER_DAY + 1);
        assert_eq!(sweep_once(Arc::clone(&ledger)).await.unwrap(), 1);

        let events = drain(&mut sub);
        assert!(matches!(
            events.as_slice(),
            [InventoryEvent::ArchivePurged { archive_id, .. }] if *archive_id == archived.id
        ));
        let history = ledger.query_history(HistoryQuery::Asset(unit.id)).unwrap();
        assert_eq!(
            history[0].reason.as_deref(),
            Some("retention expired after deletion: stolen")
        );
        assert!(ledger.find_by_serial("SN-42").unwrap().is_none());
    }

    #[tokio::test]
    async fn test_audit_log_sees_every_event() {
        let (container, _) = container();
        let ledger = Arc::clone(&container.ledger);
        let sub = container.event_bus.subscribe(EventFilter::all());
        let (tx, rx) = watch::channel(false);
        let audit = tokio::spawn(run_audit_log(sub, rx));

        let unit = ledger
            .create_unit(NewUnit::self_report("Headset", "accessories", "U3"))
            .unwrap();
        ledger
            .transfer_unit(TransferRequest::new(
                unit.id,
                OwnerRef::user("U3"),
                OwnerRef::admin_stock(),
                TransferType::ReturnCompleted,
                "A1",
            ))
            .unwrap();
        tx.send(true).unwrap();

        assert_eq!(audit.await.unwrap(), 4);
    }

    #[test]
    fn test_user_history_follows_the_unit() {
        let (container, clock) = container();
        let ledger = Arc::clone(&container.ledger);
        let unit = ledger
            .create_unit(NewUnit::admin_stock("Monitor", "computers").added_by_admin("A1"))
            .unwrap();

        for (from, to, kind) in [
            (OwnerRef::admin_stock(), OwnerRef::user("U1"), TransferType::RequestApproved),
            (OwnerRef::user("U1"), OwnerRef::user("U2"), TransferType::OwnershipChange),
            (OwnerRef::user("U2"), OwnerRef::admin_stock(), TransferType::ReturnCompleted),
        ] {
            clock.advance(60);
            ledger
                .transfer_unit(TransferRequest::new(unit.id, from, to, kind, "A1"))
                .unwrap();
        }

        let u1: Vec<_> = ledger
            .query_history(HistoryQuery::User("U1".into()))
            .unwrap()
            .into_iter()
            .map(|e| e.transfer_type)
            .collect();
        assert_eq!(u1, vec![TransferType::OwnershipChange, TransferType::RequestApproved]);

        let all = ledger.query_history(HistoryQuery::Asset(unit.id)).unwrap();
        assert_eq!(all.len(), 4);
        assert!(all.windows(2).all(|w| w[0].transfer_date >= w[1].transfer_date));
        assert_eq!(
            ledger.query_group_summary(&GroupKey::new("Monitor", "computers")).unwrap().available_quantity,
            1
        );
        assert!(ledger.query_user_owned(&"U2".into()).unwrap().is_empty());
    }
}
