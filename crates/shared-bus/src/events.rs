//! # Inventory Events
//!
//! Every event that flows through the shared bus. One event is published
//! per committed ledger mutation, plus one per summary recompute.

use serde::{Deserialize, Serialize};
use shared_types::{
    ArchiveId, AssetId, ConfigId, DeleteType, GroupKey, OwnerType, TransferType, UserId,
};

/// All events that can be published to the event bus.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum InventoryEvent {
    // =========================================================================
    // UNITS
    // =========================================================================
    /// A unit was added by an administrator or reported by a user.
    UnitCreated {
        asset_id: AssetId,
        group: GroupKey,
        owner_type: OwnerType,
        transfer_type: TransferType,
    },

    /// A unit changed hands.
    UnitTransferred {
        asset_id: AssetId,
        group: GroupKey,
        from_owner: OwnerType,
        from_user: Option<UserId>,
        to_owner: OwnerType,
        to_user: Option<UserId>,
        transfer_type: TransferType,
    },

    /// A unit's status changed.
    UnitStatusChanged {
        asset_id: AssetId,
        group: GroupKey,
        from_status: ConfigId,
        to_status: ConfigId,
    },

    // =========================================================================
    // ARCHIVE
    // =========================================================================
    /// A unit was moved into the archive.
    UnitArchived {
        archive_id: ArchiveId,
        asset_id: AssetId,
        group: GroupKey,
        delete_type: DeleteType,
    },

    /// A unit came back out of the archive.
    UnitRestored {
        archive_id: ArchiveId,
        asset_id: AssetId,
        group: GroupKey,
    },

    /// An archived unit passed its retention window and was destroyed.
    ArchivePurged {
        archive_id: ArchiveId,
        asset_id: AssetId,
        group: GroupKey,
    },

    // =========================================================================
    // STOCK
    // =========================================================================
    /// Unserialized stock units were permanently removed by a sync.
    UnitsRemoved {
        group: GroupKey,
        asset_ids: Vec<AssetId>,
    },

    /// The administrator-declared stock level changed.
    StockLevelChanged {
        group: GroupKey,
        previous: u64,
        new: u64,
    },

    // =========================================================================
    // PROJECTION
    // =========================================================================
    /// A group summary was recomputed.
    SummaryRecomputed {
        group: GroupKey,
        total: u64,
        available: u64,
        user_owned: u64,
    },
}

impl InventoryEvent {
    /// Get the topic for this event (for filtering).
    #[must_use]
    pub fn topic(&self) -> EventTopic {
        match self {
            Self::UnitCreated { .. }
            | Self::UnitTransferred { .. }
            | Self::UnitStatusChanged { .. } => EventTopic::Units,
            Self::UnitArchived { .. } | Self::UnitRestored { .. } | Self::ArchivePurged { .. } => {
                EventTopic::Archive
            }
            Self::UnitsRemoved { .. } | Self::StockLevelChanged { .. } => EventTopic::Stock,
            Self::SummaryRecomputed { .. } => EventTopic::Projection,
        }
    }

    /// The group this event concerns.
    #[must_use]
    pub fn group(&self) -> &GroupKey {
        match self {
            Self::UnitCreated { group, .. }
            | Self::UnitTransferred { group, .. }
            | Self::UnitStatusChanged { group, .. }
            | Self::UnitArchived { group, .. }
            | Self::UnitRestored { group, .. }
            | Self::ArchivePurged { group, .. }
            | Self::UnitsRemoved { group, .. }
            | Self::StockLevelChanged { group, .. }
            | Self::SummaryRecomputed { group, .. } => group,
        }
    }
}

/// Event topics for subscription filtering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EventTopic {
    /// Unit creation, transfer and status changes.
    Units,
    /// Archive moves, restores and purges.
    Archive,
    /// Stock level changes and unit removals.
    Stock,
    /// Summary recomputes.
    Projection,
    /// All events (no filtering).
    All,
}

/// Filter for subscribing to specific events.
#[derive(Debug, Clone, Default)]
pub struct EventFilter {
    /// Topics to include. Empty means all topics.
    pub topics: Vec<EventTopic>,
    /// Groups to include. Empty means all groups.
    pub groups: Vec<GroupKey>,
}

impl EventFilter {
    /// Create a filter that accepts all events.
    #[must_use]
    pub fn all() -> Self {
        Self::default()
    }

    /// Create a filter for specific topics.
    #[must_use]
    pub fn topics(topics: Vec<EventTopic>) -> Self {
        Self {
            topics,
            groups: Vec::new(),
        }
    }

    /// Create a filter for events concerning specific groups.
    #[must_use]
    pub fn for_groups(groups: Vec<GroupKey>) -> Self {
        Self {
            topics: Vec::new(),
            groups,
        }
    }

    /// Check if an event matches this filter.
    #[must_use]
    pub fn matches(&self, event: &InventoryEvent) -> bool {
        let topic_match = self.topics.is_empty()
            || self.topics.contains(&EventTopic::All)
            || self.topics.contains(&event.topic());

        let group_match = self.groups.is_empty() || self.groups.contains(event.group());

        topic_match && group_match
    }
}
