//! # Runtime Configuration
//!
//! Everything the runtime reads from its environment.
//!
//! | Variable | Default | Meaning |
//! |----------|---------|---------|
//! | `INVENTORY_DATA_DIR` | `./data` | Directory holding the ledger file and its lock |
//! | `INVENTORY_PURGE_INTERVAL_SECS` | `3600` | Seconds between retention purge sweeps |
//! | `INVENTORY_RETENTION_DAYS` | `30` | Days an archived unit stays restorable |
//! | `INVENTORY_LOG` | `info` | `tracing` filter directive |

use asset_ledger::LedgerConfig;
use shared_types::SECONDS_PER_DAY;
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

pub const ENV_DATA_DIR: &str = "INVENTORY_DATA_DIR";
pub const ENV_PURGE_INTERVAL: &str = "INVENTORY_PURGE_INTERVAL_SECS";
pub const ENV_RETENTION_DAYS: &str = "INVENTORY_RETENTION_DAYS";
pub const ENV_LOG: &str = "INVENTORY_LOG";

/// Name of the ledger snapshot inside the data directory.
pub const LEDGER_FILE: &str = "ledger.db";

/// Configuration errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    /// A variable is set but cannot be parsed.
    #[error("{var} must be a non-negative integer, got {value:?}")]
    NotANumber { var: &'static str, value: String },

    /// The purge sweep would never run.
    #[error("Purge interval must be at least one second")]
    ZeroPurgeInterval,

    /// Archived units would be purged the moment they are archived.
    #[error("Retention must be at least one day")]
    ZeroRetention,
}

/// Complete runtime configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuntimeConfig {
    /// Directory for the ledger file and the process lock.
    pub data_dir: PathBuf,
    /// Seconds between purge sweeps.
    pub purge_interval_secs: u64,
    /// `tracing` filter directive.
    pub log_filter: String,
    /// Ledger service configuration.
    pub ledger: LedgerConfig,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("./data"),
            purge_interval_secs: 3600,
            log_filter: "info".to_string(),
            ledger: LedgerConfig::default(),
        }
    }
}

impl RuntimeConfig {
    /// Load from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    /// Load using `lookup` to resolve variables. Unset variables keep their
    /// defaults.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(dir) = lookup(ENV_DATA_DIR).filter(|d| !d.trim().is_empty()) {
            config.data_dir = PathBuf::from(dir.trim());
        }
        if let Some(secs) = parse_u64(&lookup, ENV_PURGE_INTERVAL)? {
            config.purge_interval_secs = secs;
        }
        if let Some(days) = parse_u64(&lookup, ENV_RETENTION_DAYS)? {
            config.ledger = config.ledger.with_retention_days(days);
        }
        if let Some(filter) = lookup(ENV_LOG).filter(|f| !f.trim().is_empty()) {
            config.log_filter = filter.trim().to_string();
        }

        Ok(config)
    }

    /// Reject settings that would make the runtime misbehave.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.purge_interval_secs == 0 {
            return Err(ConfigError::ZeroPurgeInterval);
        }
        if self.ledger.retention_secs < SECONDS_PER_DAY {
            return Err(ConfigError::ZeroRetention);
        }
        Ok(())
    }

    #[must_use]
    pub fn purge_interval(&self) -> Duration {
        Duration::from_secs(self.purge_interval_secs)
    }

    #[must_use]
    pub fn ledger_path(&self) -> PathBuf {
        self.data_dir.join(LEDGER_FILE)
    }
}

fn parse_u64<F>(lookup: &F, var: &'static str) -> Result<Option<u64>, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let Some(raw) = lookup(var) else {
        return Ok(None);
    };
    raw.trim()
        .parse()
        .map(Some)
        .map_err(|_| ConfigError::NotANumber { var, value: raw })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| vars.get(key).cloned()
    }

    #[test]
    fn test_default_config() {
        let config = RuntimeConfig::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config, RuntimeConfig::default());
        assert_eq!(config.purge_interval(), Duration::from_secs(3600));
        assert_eq!(config.ledger.retention_secs, 30 * SECONDS_PER_DAY);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_overrides() {
        let config = RuntimeConfig::from_lookup(lookup(&[
            (ENV_DATA_DIR, "/var/lib/inventory"),
            (ENV_PURGE_INTERVAL, "60"),
            (ENV_RETENTION_DAYS, " 7 "),
            (ENV_LOG, "asset_ledger=debug"),
        ]))
        .unwrap();

        assert_eq!(config.ledger_path(), PathBuf::from("/var/lib/inventory/ledger.db"));
        assert_eq!(config.purge_interval_secs, 60);
        assert_eq!(config.ledger.retention_secs, 7 * SECONDS_PER_DAY);
        assert_eq!(config.log_filter, "asset_ledger=debug");
    }

    #[test]
    fn test_rejects_garbage_numbers() {
        let err = RuntimeConfig::from_lookup(lookup(&[(ENV_PURGE_INTERVAL, "hourly")])).unwrap_err();
        assert_eq!(
            err,
            ConfigError::NotANumber {
                var: ENV_PURGE_INTERVAL,
                value: "hourly".into()
            }
        );
    }

    #[test]
    fn test_validate_rejects_zeroes() {
        let config = RuntimeConfig::from_lookup(lookup(&[(ENV_PURGE_INTERVAL, "0")])).unwrap();
        assert_eq!(config.validate(), Err(ConfigError::ZeroPurgeInterval));

        let config = RuntimeConfig::from_lookup(lookup(&[(ENV_RETENTION_DAYS, "0")])).unwrap();
        assert_eq!(config.validate(), Err(ConfigError::ZeroRetention));
    }
}
