//! # Event Subscriber
//!
//! The collaborator side of the bus. A subscriber that falls more than the
//! channel capacity behind skips the events it missed and carries on.

use crate::events::{EventFilter, InventoryEvent};
use std::pin::Pin;
use std::task::{Context, Poll};
use thiserror::Error;
use tokio::sync::broadcast::{self, error::RecvError, error::TryRecvError};
use tokio_stream::wrappers::errors::BroadcastStreamRecvError;
use tokio_stream::wrappers::BroadcastStream;
use tokio_stream::Stream;
use tracing::{debug, warn};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SubscriptionError {
    /// Every publisher is gone.
    #[error("Event bus closed")]
    Closed,
}

/// A filtered receiver. Dropping it unsubscribes.
pub struct Subscription {
    receiver: broadcast::Receiver<InventoryEvent>,
    filter: EventFilter,
    skipped: u64,
}

impl Subscription {
    pub(crate) fn new(receiver: broadcast::Receiver<InventoryEvent>, filter: EventFilter) -> Self {
        Self {
            receiver,
            filter,
            skipped: 0,
        }
    }

    /// Wait for the next matching event. `None` once the bus is dropped.
    pub async fn recv(&mut self) -> Option<InventoryEvent> {
        loop {
            match self.receiver.recv().await {
                Ok(event) if self.filter.matches(&event) => return Some(event),
                Ok(_) => {}
                Err(RecvError::Lagged(count)) => self.lagged(count),
                Err(RecvError::Closed) => return None,
            }
        }
    }

    /// The next matching event if one is already buffered.
    pub fn try_recv(&mut self) -> Result<Option<InventoryEvent>, SubscriptionError> {
        loop {
            match self.receiver.try_recv() {
                Ok(event) if self.filter.matches(&event) => return Ok(Some(event)),
                Ok(_) => {}
                Err(TryRecvError::Lagged(count)) => self.lagged(count),
                Err(TryRecvError::Empty) => return Ok(None),
                Err(TryRecvError::Closed) => return Err(SubscriptionError::Closed),
            }
        }
    }

    #[must_use]
    pub fn filter(&self) -> &EventFilter {
        &self.filter
    }

    /// Events lost to lag since subscribing.
    #[must_use]
    pub fn skipped(&self) -> u64 {
        self.skipped
    }

    fn lagged(&mut self, count: u64) {
        self.skipped += count;
        warn!(lagged = count, topics = ?self.filter.topics, "Subscriber fell behind, events skipped");
    }
}

/// A filtered stream of events, for use with stream combinators.
pub struct EventStream {
    inner: Pin<Box<BroadcastStream<InventoryEvent>>>,
    filter: EventFilter,
}

impl EventStream {
    pub(crate) fn new(receiver: broadcast::Receiver<InventoryEvent>, filter: EventFilter) -> Self {
        Self {
            inner: Box::pin(BroadcastStream::new(receiver)),
            filter,
        }
    }

    #[must_use]
    pub fn filter(&self) -> &EventFilter {
        &self.filter
    }
}

impl Stream for EventStream {
    type Item = InventoryEvent;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let this = self.get_mut();
        loop {
            match this.inner.as_mut().poll_next(cx) {
                Poll::Ready(Some(Ok(event))) => {
                    if this.filter.matches(&event) {
                        return Poll::Ready(Some(event));
                    }
                }
                Poll::Ready(Some(Err(BroadcastStreamRecvError::Lagged(count)))) => {
                    debug!(lagged = count, "Stream lagged, some events dropped");
                }
                Poll::Ready(None) => return Poll::Ready(None),
                Poll::Pending => return Poll::Pending,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::EventTopic;
    use crate::publisher::InMemoryEventBus;
    use crate::EventPublisher;
    use shared_types::{AssetId, GroupKey};
    use std::time::Duration;
    use tokio::time::timeout;
    use tokio_stream::StreamExt;

    fn removed() -> InventoryEvent {
        InventoryEvent::UnitsRemoved {
            group: GroupKey::new("SIM card", "telecom"),
            asset_ids: vec![AssetId::new()],
        }
    }

    fn stock_changed() -> InventoryEvent {
        InventoryEvent::StockLevelChanged {
            group: GroupKey::new("SIM card", "telecom"),
            previous: 4,
            new: 2,
        }
    }

    fn recomputed() -> InventoryEvent {
        InventoryEvent::SummaryRecomputed {
            group: GroupKey::new("SIM card", "telecom"),
            total: 2,
            available: 2,
            user_owned: 0,
        }
    }

    #[tokio::test]
    async fn test_subscription_recv() {
        let bus = InMemoryEventBus::new();
        let mut sub = bus.subscribe(EventFilter::all());

        bus.publish(removed());

        let received = timeout(Duration::from_millis(100), sub.recv())
            .await
            .expect("timeout")
            .expect("event");

        assert!(matches!(received, InventoryEvent::UnitsRemoved { .. }));
    }

    #[tokio::test]
    async fn test_subscription_filter() {
        let bus = InMemoryEventBus::new();
        let mut sub = bus.subscribe(EventFilter::topics(vec![EventTopic::Projection]));

        bus.publish(stock_changed());
        bus.publish(recomputed());

        let received = timeout(Duration::from_millis(100), sub.recv())
            .await
            .expect("timeout")
            .expect("event");

        assert!(matches!(received, InventoryEvent::SummaryRecomputed { .. }));
    }

    #[tokio::test]
    async fn test_dropping_subscription_unsubscribes() {
        let bus = InMemoryEventBus::new();

        {
            let _sub1 = bus.subscribe(EventFilter::all());
            let _sub2 = bus.subscribe(EventFilter::all());
            assert_eq!(bus.subscriber_count(), 2);
        }

        assert_eq!(bus.subscriber_count(), 0);
    }

    #[tokio::test]
    async fn test_try_recv_empty_then_event() {
        let bus = InMemoryEventBus::new();
        let mut sub = bus.subscribe(EventFilter::all());

        assert!(matches!(sub.try_recv(), Ok(None)));

        bus.publish(stock_changed());
        assert!(matches!(
            sub.try_recv(),
            Ok(Some(InventoryEvent::StockLevelChanged { .. }))
        ));
    }

    #[tokio::test]
    async fn test_event_stream_skips_filtered_events() {
        let bus = InMemoryEventBus::new();
        let mut stream = bus.event_stream(EventFilter::topics(vec![EventTopic::Stock]));

        bus.publish(recomputed());
        bus.publish(stock_changed());

        let next = timeout(Duration::from_millis(100), stream.next())
            .await
            .expect("timeout")
            .expect("event");
        assert!(matches!(next, InventoryEvent::StockLevelChanged { .. }));
        assert_eq!(EventStream::filter(&stream).topics, vec![EventTopic::Stock]);
    }

    #[tokio::test]
    async fn test_lagging_subscriber_skips_and_continues() {
        let bus = InMemoryEventBus::with_capacity(2);
        let mut sub = bus.subscribe(EventFilter::all());

        for _ in 0..5 {
            bus.publish(removed());
        }

        assert!(matches!(sub.try_recv(), Ok(Some(_))));
        assert_eq!(sub.skipped(), 3);
        assert!(matches!(sub.try_recv(), Ok(Some(_))));
        assert!(matches!(sub.try_recv(), Ok(None)));
    }
}
