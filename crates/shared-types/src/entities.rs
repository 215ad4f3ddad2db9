//! # Core Entities
//!
//! ## Clusters
//!
//! - **Identity**: `AssetId`, `ArchiveId`, `UserId`, `ConfigId`
//! - **Grouping**: `GroupKey` (item name + category)
//! - **Ownership**: `OwnerType`, `TransferType`, `DeleteType`
//! - **Time**: `Timestamp` and retention constants

use crate::errors::IdentifierError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

// =============================================================================
// TIME
// =============================================================================

/// Seconds since the Unix epoch.
pub type Timestamp = u64;

/// Seconds in one day.
pub const SECONDS_PER_DAY: u64 = 86_400;

/// Days an archived unit stays restorable before it becomes purge-eligible.
pub const DEFAULT_RETENTION_DAYS: u64 = 30;

// =============================================================================
// IDENTITY
// =============================================================================

macro_rules! uuid_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        pub struct $name(pub Uuid);

        impl $name {
            /// Generate a fresh random identifier.
            #[must_use]
            pub fn new() -> Self {
                Self(Uuid::new_v4())
            }

            /// Raw bytes, used for storage keys.
            #[must_use]
            pub fn as_bytes(&self) -> &[u8; 16] {
                self.0.as_bytes()
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl FromStr for $name {
            type Err = IdentifierError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Uuid::parse_str(s.trim())
                    .map(Self)
                    .map_err(|_| IdentifierError::Malformed {
                        kind: stringify!($name),
                        value: s.to_string(),
                    })
            }
        }
    };
}

uuid_id!(
    /// Identifier of one physical unit (live record or archive snapshot).
    AssetId
);

uuid_id!(
    /// Identifier of one archive (recycle bin) entry.
    ArchiveId
);

/// Identifier of an end user or administrator, issued by the directory
/// service outside the ledger.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct UserId(pub String);

impl UserId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for UserId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

/// Reference into the externally maintained configuration
/// (categories, statuses, conditions).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ConfigId(pub String);

impl ConfigId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ConfigId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ConfigId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

// =============================================================================
// GROUPING
// =============================================================================

/// An `(itemName, categoryId)` pair. All units sharing a group key are
/// counted together in one aggregate summary.
///
/// The item name is trimmed on construction so that `" Mouse "` and
/// `"Mouse"` address the same group.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct GroupKey {
    pub item_name: String,
    pub category_id: ConfigId,
}

impl GroupKey {
    pub fn new(item_name: impl AsRef<str>, category_id: impl Into<ConfigId>) -> Self {
        Self {
            item_name: item_name.as_ref().trim().to_string(),
            category_id: category_id.into(),
        }
    }
}

impl fmt::Display for GroupKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.category_id, self.item_name)
    }
}

// =============================================================================
// OWNERSHIP
// =============================================================================

/// Who currently holds a live unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OwnerType {
    /// Held by administration, available for allocation.
    AdminStock,
    /// Checked out to (or reported by) a specific user.
    UserOwned,
}

impl OwnerType {
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            OwnerType::AdminStock => "admin_stock",
            OwnerType::UserOwned => "user_owned",
        }
    }
}

impl fmt::Display for OwnerType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Why a ledger entry was written.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransferType {
    /// A user self-reported a unit they already hold.
    UserReport,
    /// An administrator added a unit.
    AdminAdd,
    /// A user request was approved and the unit handed over.
    RequestApproved,
    /// A user returned a unit to stock.
    ReturnCompleted,
    /// Status (and possibly condition) changed; ownership untouched.
    StatusChange,
    /// Any other ownership move, including removals.
    OwnershipChange,
}

impl TransferType {
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            TransferType::UserReport => "user_report",
            TransferType::AdminAdd => "admin_add",
            TransferType::RequestApproved => "request_approved",
            TransferType::ReturnCompleted => "return_completed",
            TransferType::StatusChange => "status_change",
            TransferType::OwnershipChange => "ownership_change",
        }
    }
}

impl fmt::Display for TransferType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How a unit ended up in the archive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeleteType {
    /// A single unit was deleted.
    IndividualItem,
    /// The unit was deleted together with the rest of its group.
    CategoryBulk,
}

impl fmt::Display for DeleteType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DeleteType::IndividualItem => f.write_str("individual_item"),
            DeleteType::CategoryBulk => f.write_str("category_bulk"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_group_key_trims_item_name() {
        let a = GroupKey::new("  Mouse ", "accessories");
        let b = GroupKey::new("Mouse", "accessories");
        assert_eq!(a, b);
        assert_eq!(a.to_string(), "accessories/Mouse");
    }

    #[test]
    fn test_asset_id_parse() {
        let id = AssetId::new();
        let parsed: AssetId = id.to_string().parse().unwrap();
        assert_eq!(id, parsed);

        let err = "not-a-uuid".parse::<AssetId>().unwrap_err();
        assert!(err.to_string().contains("AssetId"));
    }

    #[test]
    fn test_owner_type_serde_names() {
        let json = serde_json::to_string(&OwnerType::AdminStock).unwrap();
        assert_eq!(json, "\"admin_stock\"");
        let json = serde_json::to_string(&TransferType::RequestApproved).unwrap();
        assert_eq!(json, "\"request_approved\"");
    }

    #[test]
    fn test_ids_are_bincode_stable() {
        let id = ArchiveId::new();
        let bytes = bincode::serialize(&id).unwrap();
        let back: ArchiveId = bincode::deserialize(&bytes).unwrap();
        assert_eq!(id, back);
    }
}
