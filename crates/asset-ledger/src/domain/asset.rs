//! # Asset Records
//!
//! One [`AssetRecord`] per physical unit. A record lives in the primary
//! store until it is archived; deleted rows are never kept in place.
//!
//! ## Ownership rule
//!
//! Every live record is held by exactly one owner type.
//! `user_owned` requires a `user_id`; `admin_stock` forbids one.
//! [`OwnerRef`] is the only way to express an owner, and its constructors
//! cannot build the invalid combinations.

use crate::domain::errors::LedgerError;
use serde::{Deserialize, Serialize};
use shared_types::{AssetId, ConfigId, GroupKey, OwnerType, Timestamp, UserId};
use std::fmt;

// =============================================================================
// OWNERSHIP
// =============================================================================

/// An owner: administration stock, or one specific user.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct OwnerRef {
    owner_type: OwnerType,
    user_id: Option<UserId>,
}

impl OwnerRef {
    /// Held by administration.
    #[must_use]
    pub fn admin_stock() -> Self {
        Self {
            owner_type: OwnerType::AdminStock,
            user_id: None,
        }
    }

    /// Held by `user`.
    pub fn user(user: impl Into<UserId>) -> Self {
        Self {
            owner_type: OwnerType::UserOwned,
            user_id: Some(user.into()),
        }
    }

    /// Build from loose parts, enforcing the ownership rule.
    pub fn from_parts(owner_type: OwnerType, user_id: Option<UserId>) -> Result<Self, LedgerError> {
        match (owner_type, user_id) {
            (OwnerType::AdminStock, None) => Ok(Self::admin_stock()),
            (OwnerType::AdminStock, Some(_)) => Err(LedgerError::validation(
                "userId",
                "admin_stock ownership must not name a user",
            )),
            (OwnerType::UserOwned, Some(user)) if !user.as_str().trim().is_empty() => {
                Ok(Self::user(user))
            }
            (OwnerType::UserOwned, _) => Err(LedgerError::validation(
                "userId",
                "user_owned ownership requires a user",
            )),
        }
    }

    #[must_use]
    pub fn owner_type(&self) -> OwnerType {
        self.owner_type
    }

    #[must_use]
    pub fn user_id(&self) -> Option<&UserId> {
        self.user_id.as_ref()
    }

    #[must_use]
    pub fn is_admin_stock(&self) -> bool {
        self.owner_type == OwnerType::AdminStock
    }
}

impl fmt::Display for OwnerRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.user_id {
            Some(user) => write!(f, "{}({})", self.owner_type, user),
            None => write!(f, "{}", self.owner_type),
        }
    }
}

/// Current ownership of a live unit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ownership {
    pub owner: OwnerRef,
    pub owned_since: Timestamp,
    /// Set only when the unit was handed to a user.
    pub assigned_by: Option<UserId>,
}

impl Ownership {
    /// Ownership as of `now`. `assigned_by` is dropped for admin stock.
    #[must_use]
    pub fn new(owner: OwnerRef, now: Timestamp, assigned_by: Option<UserId>) -> Self {
        let assigned_by = if owner.is_admin_stock() {
            None
        } else {
            assigned_by
        };
        Self {
            owner,
            owned_since: now,
            assigned_by,
        }
    }
}

// =============================================================================
// PROVENANCE
// =============================================================================

/// Who introduced a unit into the inventory.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AddedBy {
    Admin,
    User,
}

/// How a unit was acquired.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AcquisitionMethod {
    /// Added by an administrator through the stock editor.
    BulkAdd,
    /// Reported by a user who already holds it.
    SelfReport,
    /// Created by a stock sync to reach the declared level.
    StockSync,
}

/// Provenance of a unit. Written once at creation, never changed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceInfo {
    pub added_by: AddedBy,
    pub added_by_user_id: Option<UserId>,
    pub date_added: Timestamp,
    pub initial_owner_type: OwnerType,
    pub acquisition_method: AcquisitionMethod,
    pub notes: Option<String>,
}

/// Snapshot of the most recent transfer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransferInfo {
    pub transferred_from: OwnerRef,
    pub transfer_date: Timestamp,
    pub approved_by: UserId,
    pub request_id: Option<String>,
    pub return_id: Option<String>,
}

// =============================================================================
// RECORD
// =============================================================================

/// One physical unit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssetRecord {
    pub id: AssetId,
    pub item_name: String,
    pub category_id: ConfigId,
    pub serial_number: Option<String>,
    pub phone_number: Option<String>,
    pub status_id: ConfigId,
    pub condition_id: ConfigId,
    pub ownership: Ownership,
    pub source_info: SourceInfo,
    pub transfer_info: Option<TransferInfo>,
}

impl AssetRecord {
    /// The summary group this unit counts towards.
    #[must_use]
    pub fn group(&self) -> GroupKey {
        GroupKey::new(&self.item_name, self.category_id.clone())
    }

    #[must_use]
    pub fn owner(&self) -> &OwnerRef {
        &self.ownership.owner
    }

    #[must_use]
    pub fn is_serialized(&self) -> bool {
        self.serial_number.is_some()
    }

    /// Carries a serial or phone number, so it is not interchangeable with
    /// other units of its group.
    #[must_use]
    pub fn is_distinguished(&self) -> bool {
        self.is_serialized() || self.phone_number.is_some()
    }

    #[must_use]
    pub fn is_admin_sourced(&self) -> bool {
        self.source_info.added_by == AddedBy::Admin
    }

    /// Administrator-sourced and currently in stock.
    #[must_use]
    pub fn is_admin_stock_unit(&self) -> bool {
        self.is_admin_sourced() && self.owner().is_admin_stock()
    }

    /// Member of the fungible pool that stock syncs grow and shrink.
    #[must_use]
    pub fn is_sync_pool_unit(&self) -> bool {
        self.is_admin_stock_unit() && !self.is_distinguished()
    }
}

/// Request to create a unit.
///
/// Start from [`NewUnit::admin_stock`] or [`NewUnit::self_report`] and
/// refine with the `with_*` setters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewUnit {
    pub item_name: String,
    pub category_id: ConfigId,
    pub serial_number: Option<String>,
    pub phone_number: Option<String>,
    pub status_id: Option<ConfigId>,
    pub condition_id: Option<ConfigId>,
    pub added_by: AddedBy,
    pub added_by_user_id: Option<UserId>,
    pub initial_owner_type: OwnerType,
    pub user_id: Option<UserId>,
    pub assigned_by: Option<UserId>,
    pub notes: Option<String>,
}

impl NewUnit {
    /// A unit added to stock by an administrator.
    pub fn admin_stock(item_name: impl Into<String>, category_id: impl Into<ConfigId>) -> Self {
        Self {
            item_name: item_name.into(),
            category_id: category_id.into(),
            serial_number: None,
            phone_number: None,
            status_id: None,
            condition_id: None,
            added_by: AddedBy::Admin,
            added_by_user_id: None,
            initial_owner_type: OwnerType::AdminStock,
            user_id: None,
            assigned_by: None,
            notes: None,
        }
    }

    /// A unit a user reports already holding.
    pub fn self_report(
        item_name: impl Into<String>,
        category_id: impl Into<ConfigId>,
        user: impl Into<UserId>,
    ) -> Self {
        let user = user.into();
        Self {
            added_by: AddedBy::User,
            added_by_user_id: Some(user.clone()),
            initial_owner_type: OwnerType::UserOwned,
            user_id: Some(user),
            ..Self::admin_stock(item_name, category_id)
        }
    }

    pub fn with_serial(mut self, serial: impl Into<String>) -> Self {
        self.serial_number = Some(serial.into());
        self
    }

    pub fn with_phone(mut self, phone: impl Into<String>) -> Self {
        self.phone_number = Some(phone.into());
        self
    }

    pub fn with_status(mut self, status: impl Into<ConfigId>) -> Self {
        self.status_id = Some(status.into());
        self
    }

    pub fn with_condition(mut self, condition: impl Into<ConfigId>) -> Self {
        self.condition_id = Some(condition.into());
        self
    }

    pub fn with_notes(mut self, notes: impl Into<String>) -> Self {
        self.notes = Some(notes.into());
        self
    }

    /// Record which administrator added the unit.
    pub fn added_by_admin(mut self, admin: impl Into<UserId>) -> Self {
        self.added_by_user_id = Some(admin.into());
        self
    }

    /// Hand the new unit straight to `user`.
    pub fn assigned_to(mut self, user: impl Into<UserId>, assigned_by: impl Into<UserId>) -> Self {
        self.initial_owner_type = OwnerType::UserOwned;
        self.user_id = Some(user.into());
        self.assigned_by = Some(assigned_by.into());
        self
    }

    /// The initial owner, enforcing the ownership rule.
    pub fn initial_owner(&self) -> Result<OwnerRef, LedgerError> {
        OwnerRef::from_parts(self.initial_owner_type, self.user_id.clone())
    }

    #[must_use]
    pub fn acquisition_method(&self) -> AcquisitionMethod {
        match self.added_by {
            AddedBy::Admin => AcquisitionMethod::BulkAdd,
            AddedBy::User => AcquisitionMethod::SelfReport,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_owner_ref_rules() {
        assert!(OwnerRef::from_parts(OwnerType::AdminStock, None).is_ok());
        assert!(OwnerRef::from_parts(OwnerType::AdminStock, Some("U1".into())).is_err());
        assert!(OwnerRef::from_parts(OwnerType::UserOwned, None).is_err());
        assert!(OwnerRef::from_parts(OwnerType::UserOwned, Some(" ".into())).is_err());

        let owner = OwnerRef::from_parts(OwnerType::UserOwned, Some("U1".into())).unwrap();
        assert_eq!(owner, OwnerRef::user("U1"));
        assert_eq!(owner.to_string(), "user_owned(U1)");
    }

    #[test]
    fn test_admin_ownership_drops_assigner() {
        let ownership = Ownership::new(OwnerRef::admin_stock(), 10, Some("A1".into()));
        assert!(ownership.assigned_by.is_none());

        let ownership = Ownership::new(OwnerRef::user("U1"), 10, Some("A1".into()));
        assert_eq!(ownership.assigned_by, Some(UserId::from("A1")));
    }

    #[test]
    fn test_self_report_defaults() {
        let unit = NewUnit::self_report("Phone", "mobile", "U7");
        assert_eq!(unit.added_by, AddedBy::User);
        assert_eq!(unit.added_by_user_id, Some(UserId::from("U7")));
        assert_eq!(unit.initial_owner().unwrap(), OwnerRef::user("U7"));
        assert_eq!(unit.acquisition_method(), AcquisitionMethod::SelfReport);
    }

    #[test]
    fn test_assigned_to_switches_owner_type() {
        let unit = NewUnit::admin_stock("Laptop", "computers").assigned_to("U2", "A1");
        assert_eq!(unit.initial_owner_type, OwnerType::UserOwned);
        assert_eq!(unit.initial_owner().unwrap(), OwnerRef::user("U2"));
    }
}
