//! # Event Dispatch
//!
//! Delivers committed [`LedgerEvent`]s to every subscribed handler in
//! rounds. The first round is everything the commit produced; each later
//! round is the follow-ups the previous one provoked. Handing a handler the
//! whole round lets it coalesce work, so a bulk deletion recomputes its
//! group once.
//!
//! Dispatch runs after the commit. A failing handler is logged and skipped;
//! the other handlers still see the event and the commit stands.

use crate::domain::events::LedgerEvent;
use crate::ports::outbound::LedgerEventHandler;
use parking_lot::RwLock;
use std::sync::Arc;
use tracing::{trace, warn};

/// Follow-up rounds delivered after the first. Bounds handlers that keep
/// answering each other.
const MAX_FOLLOW_UP_ROUNDS: usize = 8;

/// Fan-out of ledger events to registered handlers.
#[derive(Default)]
pub struct EventDispatcher {
    handlers: RwLock<Vec<Arc<dyn LedgerEventHandler>>>,
}

impl EventDispatcher {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a handler. Handlers see each round in subscription order.
    pub fn subscribe(&self, handler: Arc<dyn LedgerEventHandler>) {
        self.handlers.write().push(handler);
    }

    /// Names of the registered handlers, in delivery order.
    #[must_use]
    pub fn handler_names(&self) -> Vec<&'static str> {
        self.handlers.read().iter().map(|h| h.name()).collect()
    }

    /// Deliver `event` and its follow-ups. Returns how many events were
    /// delivered.
    pub fn dispatch(&self, event: LedgerEvent) -> usize {
        self.dispatch_all(vec![event])
    }

    /// Deliver several events of one commit, in order, then their follow-ups.
    pub fn dispatch_all(&self, events: Vec<LedgerEvent>) -> usize {
        let handlers = self.handlers.read().clone();
        let mut round = events;
        let mut delivered = 0;

        for depth in 0..=MAX_FOLLOW_UP_ROUNDS {
            if round.is_empty() {
                return delivered;
            }
            trace!(depth, events = round.len(), "Dispatching ledger events");
            delivered += round.len();
            let mut next = Vec::new();
            for handler in &handlers {
                next.extend(handler.handle_all(&round));
            }
            round = next;
        }

        if !round.is_empty() {
            warn!(
                dropped = round.len(),
                rounds = MAX_FOLLOW_UP_ROUNDS,
                "Follow-up limit reached, dropping remaining events"
            );
        }
        delivered
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::errors::LedgerError;
    use shared_types::GroupKey;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn recomputed() -> LedgerEvent {
        LedgerEvent::SummaryRecomputed {
            group: GroupKey::new("Mouse", "accessories"),
            total: 1,
            available: 1,
            user_owned: 0,
        }
    }

    #[derive(Default)]
    struct Counter {
        seen: AtomicUsize,
    }

    impl LedgerEventHandler for Counter {
        fn name(&self) -> &'static str {
            "counter"
        }

        fn handle(&self, _event: &LedgerEvent) -> Result<Vec<LedgerEvent>, LedgerError> {
            self.seen.fetch_add(1, Ordering::SeqCst);
            Ok(Vec::new())
        }
    }

    struct Failing;

    impl LedgerEventHandler for Failing {
        fn name(&self) -> &'static str {
            "failing"
        }

        fn handle(&self, _event: &LedgerEvent) -> Result<Vec<LedgerEvent>, LedgerError> {
            Err(LedgerError::Persistence {
                message: "down".into(),
            })
        }
    }

    fn recomputed_many(count: usize) -> Vec<LedgerEvent> {
        (0..count).map(|_| recomputed()).collect()
    }

    /// Answers every event with one follow-up, forever.
    struct Echo;

    impl LedgerEventHandler for Echo {
        fn name(&self) -> &'static str {
            "echo"
        }

        fn handle(&self, event: &LedgerEvent) -> Result<Vec<LedgerEvent>, LedgerError> {
            Ok(vec![event.clone()])
        }
    }

    #[test]
    fn test_failing_handler_does_not_block_others() {
        let dispatcher = EventDispatcher::new();
        let counter = Arc::new(Counter::default());
        dispatcher.subscribe(Arc::new(Failing));
        dispatcher.subscribe(counter.clone());

        assert_eq!(dispatcher.dispatch(recomputed()), 1);
        assert_eq!(counter.seen.load(Ordering::SeqCst), 1);
        assert_eq!(dispatcher.handler_names(), vec!["failing", "counter"]);
    }

    #[test]
    fn test_follow_ups_stop_after_round_limit() {
        let dispatcher = EventDispatcher::new();
        let counter = Arc::new(Counter::default());
        dispatcher.subscribe(Arc::new(Echo));
        dispatcher.subscribe(counter.clone());

        let delivered = dispatcher.dispatch(recomputed());

        assert_eq!(delivered, MAX_FOLLOW_UP_ROUNDS + 1);
        assert_eq!(counter.seen.load(Ordering::SeqCst), MAX_FOLLOW_UP_ROUNDS + 1);
    }

    #[test]
    fn test_large_first_round_is_delivered_whole() {
        let dispatcher = EventDispatcher::new();
        let counter = Arc::new(Counter::default());
        dispatcher.subscribe(counter.clone());

        assert_eq!(dispatcher.dispatch_all(recomputed_many(5000)), 5000);
        assert_eq!(counter.seen.load(Ordering::SeqCst), 5000);
    }

    #[test]
    fn test_no_handlers() {
        let dispatcher = EventDispatcher::new();
        assert_eq!(dispatcher.dispatch_all(recomputed_many(2)), 2);
    }
}
