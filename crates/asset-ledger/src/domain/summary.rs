//! # Aggregate Summaries
//!
//! One [`AggregateSummary`] per `(itemName, categoryId)` group. It is a
//! materialized view over the group's live units plus the administrator's
//! stock declaration and its operation log.
//!
//! Breakdowns use `BTreeMap` so that two recomputes over the same units
//! encode to identical bytes.

use serde::{Deserialize, Serialize};
use shared_types::{ConfigId, GroupKey, Timestamp, UserId};
use std::collections::BTreeMap;

/// Stock accounting for a group.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StockManagement {
    /// Administrator-declared count of admin-held units.
    pub admin_defined_stock: u64,
    /// Units that entered the inventory via self-report.
    pub user_contributed_count: u64,
    /// Administrator-sourced units currently held by users.
    pub currently_allocated: u64,
    /// `max(0, admin_defined_stock - currently_allocated)`.
    pub real_available: u64,
}

impl StockManagement {
    pub(crate) fn refresh_real_available(&mut self) {
        self.real_available = self
            .admin_defined_stock
            .saturating_sub(self.currently_allocated);
    }
}

/// Kind of change recorded in the operations history.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StockOperationKind {
    Set,
    Adjust,
    Sync,
    AutoCorrect,
    /// Declared level put back by a restore from the archive.
    Restore,
}

/// One entry of the stock operations history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StockOperation {
    pub kind: StockOperationKind,
    pub previous_value: u64,
    pub new_value: u64,
    pub reason: String,
    pub performed_by: Option<UserId>,
    pub performed_at: Timestamp,
}

/// Derived statistics for one group.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AggregateSummary {
    pub group: GroupKey,
    pub total_quantity: u64,
    /// Units held by admin stock.
    pub available_quantity: u64,
    pub user_owned_quantity: u64,
    pub status_breakdown: BTreeMap<ConfigId, u64>,
    pub condition_breakdown: BTreeMap<ConfigId, u64>,
    pub stock_management: StockManagement,
    pub operations_history: Vec<StockOperation>,
}

impl AggregateSummary {
    /// Summary of a group with no units and no history.
    #[must_use]
    pub fn empty(group: GroupKey) -> Self {
        Self {
            group,
            total_quantity: 0,
            available_quantity: 0,
            user_owned_quantity: 0,
            status_breakdown: BTreeMap::new(),
            condition_breakdown: BTreeMap::new(),
            stock_management: StockManagement::default(),
            operations_history: Vec::new(),
        }
    }

    #[must_use]
    pub fn admin_defined_stock(&self) -> u64 {
        self.stock_management.admin_defined_stock
    }

    /// Owner-type counts add up to the total.
    #[must_use]
    pub fn is_balanced(&self) -> bool {
        self.available_quantity + self.user_owned_quantity == self.total_quantity
    }

    /// Change the declared stock and log the change.
    pub fn record_stock_change(
        &mut self,
        kind: StockOperationKind,
        new_value: u64,
        reason: impl Into<String>,
        performed_by: Option<UserId>,
        now: Timestamp,
    ) {
        let previous_value = self.stock_management.admin_defined_stock;
        self.operations_history.push(StockOperation {
            kind,
            previous_value,
            new_value,
            reason: reason.into(),
            performed_by,
            performed_at: now,
        });
        self.stock_management.admin_defined_stock = new_value;
        self.stock_management.refresh_real_available();
    }

    #[must_use]
    pub fn last_operation(&self) -> Option<&StockOperation> {
        self.operations_history.last()
    }
}
