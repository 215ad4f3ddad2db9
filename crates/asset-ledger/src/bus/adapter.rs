//! # Ledger Bus Adapter
//!
//! A [`LedgerEventHandler`] that translates ledger events into
//! [`InventoryEvent`]s and publishes them. Publishing is fire-and-forget;
//! the adapter never fails and never produces follow-up events.

use crate::domain::errors::LedgerError;
use crate::domain::events::LedgerEvent;
use crate::ports::outbound::LedgerEventHandler;
use shared_bus::{EventPublisher, InventoryEvent};
use std::sync::Arc;
use tracing::trace;

/// Forwards ledger events to the shared bus.
pub struct LedgerBusAdapter {
    publisher: Arc<dyn EventPublisher>,
}

impl LedgerBusAdapter {
    pub fn new(publisher: Arc<dyn EventPublisher>) -> Self {
        Self { publisher }
    }
}

impl LedgerEventHandler for LedgerBusAdapter {
    fn name(&self) -> &'static str {
        "bus-adapter"
    }

    fn handle(&self, event: &LedgerEvent) -> Result<Vec<LedgerEvent>, LedgerError> {
        for bus_event in to_bus_events(event) {
            let receivers = self.publisher.publish(bus_event);
            trace!(event = event.name(), receivers, "Forwarded ledger event to bus");
        }
        Ok(Vec::new())
    }
}

/// Bus events announcing `event`.
#[must_use]
pub fn to_bus_events(event: &LedgerEvent) -> Vec<InventoryEvent> {
    match event.clone() {
        LedgerEvent::UnitCreated {
            asset_id,
            group,
            owner,
            transfer_type,
        } => vec![InventoryEvent::UnitCreated {
            asset_id,
            group,
            owner_type: owner.owner_type(),
            transfer_type,
        }],
        LedgerEvent::UnitTransferred {
            asset_id,
            group,
            from,
            to,
            transfer_type,
        } => vec![InventoryEvent::UnitTransferred {
            asset_id,
            group,
            from_owner: from.owner_type(),
            from_user: from.user_id().cloned(),
            to_owner: to.owner_type(),
            to_user: to.user_id().cloned(),
            transfer_type,
        }],
        LedgerEvent::UnitStatusChanged {
            asset_id,
            group,
            from_status,
            to_status,
        } => vec![InventoryEvent::UnitStatusChanged {
            asset_id,
            group,
            from_status,
            to_status,
        }],
        LedgerEvent::UnitArchived {
            archive_id,
            asset_id,
            group,
            delete_type,
        } => vec![InventoryEvent::UnitArchived {
            archive_id,
            asset_id,
            group,
            delete_type,
        }],
        LedgerEvent::UnitRestored {
            archive_id,
            asset_id,
            group,
        } => vec![InventoryEvent::UnitRestored {
            archive_id,
            asset_id,
            group,
        }],
        LedgerEvent::ArchivePurged {
            archive_id,
            asset_id,
            group,
        } => vec![InventoryEvent::ArchivePurged {
            archive_id,
            asset_id,
            group,
        }],
        LedgerEvent::StockLevelChanged {
            group,
            previous,
            new,
            removed,
            ..
        } => {
            let mut events = vec![InventoryEvent::StockLevelChanged {
                group: group.clone(),
                previous,
                new,
            }];
            if !removed.is_empty() {
                events.push(InventoryEvent::UnitsRemoved {
                    group,
                    asset_ids: removed,
                });
            }
            events
        }
        LedgerEvent::SummaryRecomputed {
            group,
            total,
            available,
            user_owned,
        } => vec![InventoryEvent::SummaryRecomputed {
            group,
            total,
            available,
            user_owned,
        }],
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::asset::OwnerRef;
    use shared_bus::{EventFilter, EventTopic, InMemoryEventBus};
    use shared_types::{AssetId, GroupKey, OwnerType, TransferType};

    fn sims() -> GroupKey {
        GroupKey::new("SIM card", "telecom")
    }

    #[test]
    fn test_shrink_fans_out_to_units_removed() {
        let removed = vec![AssetId::new(), AssetId::new()];
        let events = to_bus_events(&LedgerEvent::StockLevelChanged {
            group: sims(),
            previous: 5,
            new: 3,
            created: Vec::new(),
            removed: removed.clone(),
        });

        assert_eq!(events.len(), 2);
        assert_eq!(
            events[1],
            InventoryEvent::UnitsRemoved {
                group: sims(),
                asset_ids: removed,
            }
        );
    }

    #[test]
    fn test_grow_publishes_only_level_change() {
        let events = to_bus_events(&LedgerEvent::StockLevelChanged {
            group: sims(),
            previous: 1,
            new: 3,
            created: vec![AssetId::new(), AssetId::new()],
            removed: Vec::new(),
        });
        assert_eq!(
            events,
            vec![InventoryEvent::StockLevelChanged {
                group: sims(),
                previous: 1,
                new: 3,
            }]
        );
    }

    #[test]
    fn test_transfer_carries_both_sides() {
        let events = to_bus_events(&LedgerEvent::UnitTransferred {
            asset_id: AssetId::new(),
            group: sims(),
            from: OwnerRef::admin_stock(),
            to: OwnerRef::user("U1"),
            transfer_type: TransferType::RequestApproved,
        });
        match &events[..] {
            [InventoryEvent::UnitTransferred {
                from_owner,
                from_user,
                to_owner,
                to_user,
                ..
            }] => {
                assert_eq!(*from_owner, OwnerType::AdminStock);
                assert!(from_user.is_none());
                assert_eq!(*to_owner, OwnerType::UserOwned);
                assert_eq!(to_user.as_ref().map(|u| u.as_str()), Some("U1"));
            }
            other => panic!("unexpected events: {:?}", other),
        }
    }

    #[test]
    fn test_adapter_publishes_to_bus() {
        let bus = Arc::new(InMemoryEventBus::new());
        let mut sub = bus.subscribe(EventFilter::topics(vec![EventTopic::Projection]));
        let adapter = LedgerBusAdapter::new(bus.clone());

        let follow_ups = adapter
            .handle(&LedgerEvent::SummaryRecomputed {
                group: sims(),
                total: 2,
                available: 2,
                user_owned: 0,
            })
            .unwrap();

        assert!(follow_ups.is_empty());
        assert_eq!(bus.events_published(), 1);
        assert!(matches!(
            sub.try_recv(),
            Ok(Some(InventoryEvent::SummaryRecomputed { total: 2, .. }))
        ));
    }
}
