//! # Event Publisher
//!
//! The ledger side of the bus. Publishing is fire-and-forget: the mutation
//! is already committed when its event goes out, so a send with nobody
//! listening is only counted.

use crate::events::{EventFilter, EventTopic, InventoryEvent};
use crate::subscriber::{EventStream, Subscription};
use crate::DEFAULT_CHANNEL_CAPACITY;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::broadcast;
use tracing::{debug, trace};

/// Announces committed ledger mutations.
pub trait EventPublisher: Send + Sync {
    /// Send `event` to every live subscriber. Returns how many received it.
    fn publish(&self, event: InventoryEvent) -> usize;

    /// Events handed to the bus so far, delivered or not.
    fn events_published(&self) -> u64;
}

/// Single-process bus over `tokio::sync::broadcast`.
///
/// Every subscriber sees every event; topic filtering happens on the
/// receiving side.
pub struct InMemoryEventBus {
    sender: broadcast::Sender<InventoryEvent>,
    published: AtomicU64,
    per_topic: Mutex<HashMap<EventTopic, u64>>,
    capacity: usize,
}

impl InMemoryEventBus {
    #[must_use]
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CHANNEL_CAPACITY)
    }

    /// A bus whose subscribers buffer at most `capacity` unread events.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self {
            sender,
            published: AtomicU64::new(0),
            per_topic: Mutex::new(HashMap::new()),
            capacity,
        }
    }

    /// Receive events matching `filter` from now on.
    #[must_use]
    pub fn subscribe(&self, filter: EventFilter) -> Subscription {
        debug!(topics = ?filter.topics, "Collaborator subscribed");
        Subscription::new(self.sender.subscribe(), filter)
    }

    /// Same as [`subscribe`](Self::subscribe), as a `Stream`.
    #[must_use]
    pub fn event_stream(&self, filter: EventFilter) -> EventStream {
        EventStream::new(self.sender.subscribe(), filter)
    }

    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }

    #[must_use]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Events published on `topic`. `EventTopic::All` gives the grand total.
    #[must_use]
    pub fn published_on(&self, topic: EventTopic) -> u64 {
        match topic {
            EventTopic::All => self.events_published(),
            topic => self.per_topic.lock().get(&topic).copied().unwrap_or(0),
        }
    }
}

impl Default for InMemoryEventBus {
    fn default() -> Self {
        Self::new()
    }
}

impl EventPublisher for InMemoryEventBus {
    fn publish(&self, event: InventoryEvent) -> usize {
        let topic = event.topic();
        self.published.fetch_add(1, Ordering::Relaxed);
        *self.per_topic.lock().entry(topic).or_insert(0) += 1;

        match self.sender.send(event) {
            Ok(receivers) => {
                debug!(?topic, receivers, "Event published");
                receivers
            }
            Err(_) => {
                trace!(?topic, "Event dropped, nobody subscribed");
                0
            }
        }
    }

    fn events_published(&self) -> u64 {
        self.published.load(Ordering::Relaxed)
    }
}
