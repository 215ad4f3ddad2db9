//! # Static Catalog
//!
//! In-process [`StatusCatalog`] built from a fixed [`CatalogConfig`]. The
//! real configuration is maintained outside the ledger; hosts load it and
//! hand it over here.

use crate::ports::outbound::StatusCatalog;
use shared_types::ConfigId;
use std::collections::{HashMap, HashSet};

/// A category entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CategoryConfig {
    pub id: ConfigId,
    /// Units in this category may carry a phone number.
    pub phone_capable: bool,
}

/// A status entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusConfig {
    pub id: ConfigId,
    /// Takes the unit out of circulation (e.g. retired).
    pub terminal: bool,
}

/// The catalog contents.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogConfig {
    pub categories: Vec<CategoryConfig>,
    pub statuses: Vec<StatusConfig>,
    pub conditions: Vec<ConfigId>,
    pub default_status: ConfigId,
    pub default_condition: ConfigId,
    /// Status a stock unit must have to be removable by a shrink.
    pub disposable_status: ConfigId,
    /// Condition a stock unit must have to be removable by a shrink.
    pub disposable_condition: ConfigId,
}

impl Default for CatalogConfig {
    fn default() -> Self {
        let category = |id: &str, phone_capable| CategoryConfig {
            id: id.into(),
            phone_capable,
        };
        let status = |id: &str, terminal| StatusConfig {
            id: id.into(),
            terminal,
        };
        Self {
            categories: vec![
                category("computers", false),
                category("accessories", false),
                category("furniture", false),
                category("telecom", true),
                category("mobile", true),
            ],
            statuses: vec![
                status("available", false),
                status("assigned", false),
                status("maintenance", false),
                status("retired", true),
            ],
            conditions: vec!["working".into(), "worn".into(), "broken".into()],
            default_status: "available".into(),
            default_condition: "working".into(),
            disposable_status: "available".into(),
            disposable_condition: "working".into(),
        }
    }
}

/// Catalog backed by hash lookups over a [`CatalogConfig`].
#[derive(Debug, Clone)]
pub struct StaticCatalog {
    categories: HashMap<ConfigId, bool>,
    statuses: HashMap<ConfigId, bool>,
    conditions: HashSet<ConfigId>,
    config: CatalogConfig,
}

impl StaticCatalog {
    pub fn new(config: CatalogConfig) -> Self {
        Self {
            categories: config
                .categories
                .iter()
                .map(|c| (c.id.clone(), c.phone_capable))
                .collect(),
            statuses: config
                .statuses
                .iter()
                .map(|s| (s.id.clone(), s.terminal))
                .collect(),
            conditions: config.conditions.iter().cloned().collect(),
            config,
        }
    }

    pub fn config(&self) -> &CatalogConfig {
        &self.config
    }
}

impl Default for StaticCatalog {
    fn default() -> Self {
        Self::new(CatalogConfig::default())
    }
}

impl StatusCatalog for StaticCatalog {
    fn category_exists(&self, category: &ConfigId) -> bool {
        self.categories.contains_key(category)
    }

    fn category_supports_phone(&self, category: &ConfigId) -> bool {
        self.categories.get(category).copied().unwrap_or(false)
    }

    fn status_exists(&self, status: &ConfigId) -> bool {
        self.statuses.contains_key(status)
    }

    fn condition_exists(&self, condition: &ConfigId) -> bool {
        self.conditions.contains(condition)
    }

    fn is_terminal_status(&self, status: &ConfigId) -> bool {
        self.statuses.get(status).copied().unwrap_or(false)
    }

    fn default_status(&self) -> ConfigId {
        self.config.default_status.clone()
    }

    fn default_condition(&self) -> ConfigId {
        self.config.default_condition.clone()
    }

    fn is_disposable(&self, status: &ConfigId, condition: &ConfigId) -> bool {
        *status == self.config.disposable_status && *condition == self.config.disposable_condition
    }
}
