//! # Shared Bus - Event Bus for Inventory Collaborators
//!
//! The ledger core announces every committed mutation as an
//! [`InventoryEvent`]. Collaborators outside the core (notification
//! rendering, reporting views, audit logging) subscribe here instead of
//! calling into the ledger.
//!
//! ```text
//! ┌──────────────┐                    ┌──────────────────┐
//! │ Asset Ledger │    publish()       │  Collaborator    │
//! │   (core)     │ ──────┐            │ (mailer, audit)  │
//! └──────────────┘       │            └──────────────────┘
//!                        ▼                    ↑
//!                  ┌──────────────┐          │
//!                  │  Event Bus   │ ─────────┘
//!                  └──────────────┘  subscribe()
//! ```
//!
//! The bus is fire-and-forget: an event published with no subscribers is
//! dropped, and a lagging subscriber skips what it missed. Nothing in the
//! ledger's consistency depends on delivery.

#![cfg_attr(test, allow(clippy::unwrap_used, clippy::expect_used))]

pub mod events;
pub mod publisher;
pub mod subscriber;

pub use events::{EventFilter, EventTopic, InventoryEvent};
pub use publisher::{EventPublisher, InMemoryEventBus};
pub use subscriber::{EventStream, Subscription, SubscriptionError};

/// Unread events a subscriber may buffer before it starts skipping.
pub const DEFAULT_CHANNEL_CAPACITY: usize = 1000;
