//! # Ledger Events
//!
//! Every committed mutation emits exactly one [`LedgerEvent`]. Events are
//! dispatched after the commit, so a handler always observes state that
//! already includes the change.
//!
//! The summary projector is the only handler that recomputes; it answers
//! each recompute with a [`LedgerEvent::SummaryRecomputed`] follow-up.

use crate::domain::asset::OwnerRef;
use crate::domain::projection::RecomputeMode;
use shared_types::{ArchiveId, AssetId, ConfigId, DeleteType, GroupKey, TransferType};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LedgerEvent {
    UnitCreated {
        asset_id: AssetId,
        group: GroupKey,
        owner: OwnerRef,
        transfer_type: TransferType,
    },
    UnitTransferred {
        asset_id: AssetId,
        group: GroupKey,
        from: OwnerRef,
        to: OwnerRef,
        transfer_type: TransferType,
    },
    UnitStatusChanged {
        asset_id: AssetId,
        group: GroupKey,
        from_status: ConfigId,
        to_status: ConfigId,
    },
    UnitArchived {
        archive_id: ArchiveId,
        asset_id: AssetId,
        group: GroupKey,
        delete_type: DeleteType,
    },
    UnitRestored {
        archive_id: ArchiveId,
        asset_id: AssetId,
        group: GroupKey,
    },
    ArchivePurged {
        archive_id: ArchiveId,
        asset_id: AssetId,
        group: GroupKey,
    },
    /// A set/adjust/sync of the stock pool. `created` and `removed` list
    /// the pool units the sync added or permanently deleted.
    StockLevelChanged {
        group: GroupKey,
        previous: u64,
        new: u64,
        created: Vec<AssetId>,
        removed: Vec<AssetId>,
    },
    SummaryRecomputed {
        group: GroupKey,
        total: u64,
        available: u64,
        user_owned: u64,
    },
}

impl LedgerEvent {
    #[must_use]
    pub fn group(&self) -> &GroupKey {
        match self {
            LedgerEvent::UnitCreated { group, .. }
            | LedgerEvent::UnitTransferred { group, .. }
            | LedgerEvent::UnitStatusChanged { group, .. }
            | LedgerEvent::UnitArchived { group, .. }
            | LedgerEvent::UnitRestored { group, .. }
            | LedgerEvent::ArchivePurged { group, .. }
            | LedgerEvent::StockLevelChanged { group, .. }
            | LedgerEvent::SummaryRecomputed { group, .. } => group,
        }
    }

    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            LedgerEvent::UnitCreated { .. } => "UnitCreated",
            LedgerEvent::UnitTransferred { .. } => "UnitTransferred",
            LedgerEvent::UnitStatusChanged { .. } => "UnitStatusChanged",
            LedgerEvent::UnitArchived { .. } => "UnitArchived",
            LedgerEvent::UnitRestored { .. } => "UnitRestored",
            LedgerEvent::ArchivePurged { .. } => "ArchivePurged",
            LedgerEvent::StockLevelChanged { .. } => "StockLevelChanged",
            LedgerEvent::SummaryRecomputed { .. } => "SummaryRecomputed",
        }
    }

    /// How the group summary must be recomputed after this event, if at all.
    ///
    /// Purges only touch the archive and recompute notices are outputs, so
    /// neither triggers a recompute. A restore trusts the recorded stock.
    #[must_use]
    pub fn recompute_mode(&self) -> Option<RecomputeMode> {
        match self {
            LedgerEvent::ArchivePurged { .. } | LedgerEvent::SummaryRecomputed { .. } => None,
            LedgerEvent::UnitRestored { .. } => Some(RecomputeMode::TrustRecorded),
            _ => Some(RecomputeMode::AutoDetect),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn group() -> GroupKey {
        GroupKey::new("Mouse", "accessories")
    }

    #[test]
    fn test_recompute_modes() {
        let restored = LedgerEvent::UnitRestored {
            archive_id: ArchiveId::new(),
            asset_id: AssetId::new(),
            group: group(),
        };
        assert_eq!(restored.recompute_mode(), Some(RecomputeMode::TrustRecorded));

        let purged = LedgerEvent::ArchivePurged {
            archive_id: ArchiveId::new(),
            asset_id: AssetId::new(),
            group: group(),
        };
        assert_eq!(purged.recompute_mode(), None);

        let created = LedgerEvent::UnitCreated {
            asset_id: AssetId::new(),
            group: group(),
            owner: OwnerRef::admin_stock(),
            transfer_type: TransferType::AdminAdd,
        };
        assert_eq!(created.recompute_mode(), Some(RecomputeMode::AutoDetect));
        assert_eq!(created.name(), "UnitCreated");
        assert_eq!(created.group(), &group());
    }
}
