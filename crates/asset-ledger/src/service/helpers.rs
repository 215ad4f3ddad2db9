//! # Asset Ledger Service - Helper Methods
//!
//! Private helpers shared by the operation modules: the conflict retry
//! loop, reservation checks and catalog validation.

use super::*;
use crate::domain::errors::UnitHolder;
use crate::domain::summary::AggregateSummary;
use crate::domain::validation;
use crate::domain::value_objects::KeyPrefix;
use shared_types::{ConfigId, GroupKey};
use tracing::{debug, warn};

/// Which uniqueness-constrained field a reservation key belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Reserved {
    Serial,
    Phone,
}

impl Reserved {
    pub(crate) fn key(self, value: &str) -> Vec<u8> {
        match self {
            Reserved::Serial => KeyPrefix::serial_key(value),
            Reserved::Phone => KeyPrefix::phone_key(value),
        }
    }

    pub(crate) fn conflict(self, value: &str, holder: UnitHolder) -> LedgerError {
        match self {
            Reserved::Serial => LedgerError::DuplicateSerial {
                serial: value.to_string(),
                holder,
            },
            Reserved::Phone => LedgerError::DuplicatePhone {
                phone: value.to_string(),
                holder,
            },
        }
    }
}

impl<KV, TS, CAT> AssetLedgerService<KV, TS, CAT>
where
    KV: KeyValueStore + 'static,
    TS: TimeSource + 'static,
    CAT: StatusCatalog,
{
    /// Run `attempt` until it commits.
    ///
    /// `attempt` re-reads everything it depends on and returns `Ok(None)`
    /// when its batch lost a guard race. Errors end the loop immediately.
    pub(crate) fn with_retries<T, F>(
        &self,
        operation: &'static str,
        mut attempt: F,
    ) -> Result<T, LedgerError>
    where
        F: FnMut() -> Result<Option<T>, LedgerError>,
    {
        let limit = self.config.max_write_retries;
        for round in 1..=limit {
            if let Some(outcome) = attempt()? {
                return Ok(outcome);
            }
            debug!(operation, round, "Write conflict, retrying");
        }
        warn!(operation, attempts = limit, "Giving up after repeated write conflicts");
        Err(LedgerError::Persistence {
            message: format!("{} kept conflicting after {} attempts", operation, limit),
        })
    }

    /// Fail if `value` is already held by a live or archived unit.
    pub(crate) fn ensure_unreserved(&self, kind: Reserved, value: &str) -> Result<(), LedgerError> {
        match self.store.reservation(&kind.key(value))? {
            Some(held) => Err(kind.conflict(value, held.value)),
            None => Ok(()),
        }
    }

    /// Queue the release of every serial/phone reservation still held by
    /// `holder`. A reservation already handed to someone else is left alone.
    pub(crate) fn release_reservations(
        &self,
        batch: &mut WriteBatch,
        serial: Option<&str>,
        phone: Option<&str>,
        holder: UnitHolder,
    ) -> Result<(), LedgerError> {
        for (kind, value) in [(Reserved::Serial, serial), (Reserved::Phone, phone)] {
            let Some(value) = value else { continue };
            let key = kind.key(value);
            if let Some(held) = self.store.reservation(&key)? {
                if held.value == holder {
                    batch.release(key, &held);
                }
            }
        }
        Ok(())
    }

    /// The live unit holding a serial/phone reservation, if any.
    pub(crate) fn live_holder(
        &self,
        kind: Reserved,
        value: &str,
    ) -> Result<Option<AssetRecord>, LedgerError> {
        match self.store.reservation(&kind.key(value))? {
            Some(Loaded {
                value: UnitHolder::Live(id),
                ..
            }) => Ok(self.store.asset(&id)?.map(|loaded| loaded.value)),
            _ => Ok(None),
        }
    }

    pub(crate) fn require_category(&self, category: &ConfigId) -> Result<(), LedgerError> {
        if self.catalog.category_exists(category) {
            Ok(())
        } else {
            Err(LedgerError::validation(
                "categoryId",
                format!("unknown category {:?}", category.as_str()),
            ))
        }
    }

    pub(crate) fn require_status(&self, status: &ConfigId) -> Result<(), LedgerError> {
        if self.catalog.status_exists(status) {
            Ok(())
        } else {
            Err(LedgerError::validation(
                "statusId",
                format!("unknown status {:?}", status.as_str()),
            ))
        }
    }

    pub(crate) fn require_condition(&self, condition: &ConfigId) -> Result<(), LedgerError> {
        if self.catalog.condition_exists(condition) {
            Ok(())
        } else {
            Err(LedgerError::validation(
                "conditionId",
                format!("unknown condition {:?}", condition.as_str()),
            ))
        }
    }

    /// Normalise a group key coming from a caller.
    pub(crate) fn checked_group(&self, group: &GroupKey) -> Result<GroupKey, LedgerError> {
        let item_name = validation::item_name(&group.item_name)?;
        self.require_category(&group.category_id)?;
        Ok(GroupKey::new(item_name, group.category_id.clone()))
    }

    /// Stored summary of `group`, recomputed on the spot if it is missing.
    pub(crate) fn current_summary(&self, group: &GroupKey) -> Result<AggregateSummary, LedgerError> {
        match self.store.summary(group)? {
            Some(loaded) => Ok(loaded.value),
            None => self.projector.recompute(group, RecomputeMode::AutoDetect),
        }
    }

    /// Dispatch events for a commit that already happened.
    pub(crate) fn announce(&self, events: Vec<LedgerEvent>) {
        if !events.is_empty() {
            self.dispatcher.dispatch_all(events);
        }
    }
}
