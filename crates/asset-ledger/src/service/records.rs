//! # Unit Creation
//!
//! Creating a unit claims its serial and phone reservations in the same
//! batch as the record and its `NewItem` ledger entry. The advisory
//! reservation read gives a precise error in the common case; the
//! `ExpectAbsent` guards decide the race when two creators collide.

use super::helpers::Reserved;
use super::*;
use crate::domain::asset::{AddedBy, NewUnit, OwnerRef, Ownership, SourceInfo};
use crate::domain::errors::UnitHolder;
use crate::domain::ledger::{OwnershipSnapshot, PendingEntry};
use crate::domain::validation;
use crate::domain::value_objects::KeyPrefix;
use shared_types::{AssetId, ConfigId, GroupKey, Timestamp, TransferType, UserId};
use tracing::info;

/// A [`NewUnit`] that passed validation.
struct CheckedUnit {
    item_name: String,
    category_id: ConfigId,
    serial_number: Option<String>,
    phone_number: Option<String>,
    status_id: ConfigId,
    condition_id: ConfigId,
    owner: OwnerRef,
    source: NewUnit,
}

impl<KV, TS, CAT> AssetLedgerService<KV, TS, CAT>
where
    KV: KeyValueStore + 'static,
    TS: TimeSource + 'static,
    CAT: StatusCatalog,
{
    fn check_new_unit(&self, unit: NewUnit) -> Result<CheckedUnit, LedgerError> {
        let item_name = validation::item_name(&unit.item_name)?;
        self.require_category(&unit.category_id)?;

        let serial_number = validation::serial_number(unit.serial_number.as_deref());
        let phone_number = validation::phone_number(unit.phone_number.as_deref())?;
        if phone_number.is_some() && !self.catalog.category_supports_phone(&unit.category_id) {
            return Err(LedgerError::validation(
                "phoneNumber",
                format!(
                    "category {:?} does not carry phone numbers",
                    unit.category_id.as_str()
                ),
            ));
        }

        let status_id = unit
            .status_id
            .clone()
            .unwrap_or_else(|| self.catalog.default_status());
        self.require_status(&status_id)?;
        let condition_id = unit
            .condition_id
            .clone()
            .unwrap_or_else(|| self.catalog.default_condition());
        self.require_condition(&condition_id)?;

        if unit.added_by == AddedBy::User
            && unit
                .added_by_user_id
                .as_ref()
                .map_or(true, |u| u.as_str().trim().is_empty())
        {
            return Err(LedgerError::validation(
                "addedByUserId",
                "a self-reported unit must name the reporting user",
            ));
        }
        let owner = unit.initial_owner()?;

        Ok(CheckedUnit {
            item_name,
            category_id: unit.category_id.clone(),
            serial_number,
            phone_number,
            status_id,
            condition_id,
            owner,
            source: unit,
        })
    }

    /// Validate, then commit a new unit with its reservations and its
    /// creation entry.
    pub(crate) fn commit_new_unit(&self, unit: NewUnit) -> Result<AssetRecord, LedgerError> {
        let checked = self.check_new_unit(unit)?;
        let id = AssetId::new();

        let record = self.with_retries("create_unit", || {
            if let Some(serial) = &checked.serial_number {
                self.ensure_unreserved(Reserved::Serial, serial)?;
            }
            if let Some(phone) = &checked.phone_number {
                self.ensure_unreserved(Reserved::Phone, phone)?;
            }

            let now = self.time_source.now();
            let record = build_record(id, &checked, now);

            let mut batch = WriteBatch::new(self.store.ledger_head()?);
            batch.insert_asset(&record)?;
            if let Some(serial) = &record.serial_number {
                batch.claim(KeyPrefix::serial_key(serial), UnitHolder::Live(id))?;
            }
            if let Some(phone) = &record.phone_number {
                batch.claim(KeyPrefix::phone_key(phone), UnitHolder::Live(id))?;
            }
            batch.append(
                PendingEntry::for_record(
                    &record,
                    creation_transfer_type(&record),
                    OwnershipSnapshot::new_item(),
                    record.owner().into(),
                    now,
                )
                .processed_by(record.source_info.added_by_user_id.clone())
                .reason(record.source_info.notes.clone()),
            )?;

            Ok(self.store.commit(batch)?.then_some(record))
        })?;

        info!(
            asset_id = %record.id,
            group = %record.group(),
            owner = %record.owner(),
            "Unit created"
        );
        self.announce(vec![LedgerEvent::UnitCreated {
            asset_id: record.id,
            group: record.group(),
            owner: record.owner().clone(),
            transfer_type: creation_transfer_type(&record),
        }]);
        Ok(record)
    }

    /// Admin-held units of `group` that are not in a terminal status,
    /// oldest first, capped at the configured query limit.
    pub(crate) fn available_units(
        &self,
        group: &GroupKey,
        limit: usize,
    ) -> Result<Vec<AssetRecord>, LedgerError> {
        let limit = limit.min(self.config.max_query_limit);
        let mut units: Vec<AssetRecord> = self
            .store
            .group_units(group)?
            .into_iter()
            .map(|loaded| loaded.value)
            .filter(|u| {
                u.owner().is_admin_stock() && !self.catalog.is_terminal_status(&u.status_id)
            })
            .collect();
        units.sort_by(|a, b| {
            a.source_info
                .date_added
                .cmp(&b.source_info.date_added)
                .then_with(|| a.id.cmp(&b.id))
        });
        units.truncate(limit);
        Ok(units)
    }

    /// Units held by `user`, longest-held first.
    pub(crate) fn units_owned_by(&self, user: &UserId) -> Result<Vec<AssetRecord>, LedgerError> {
        let mut units: Vec<AssetRecord> = self
            .store
            .owner_units(user)?
            .into_iter()
            .map(|loaded| loaded.value)
            .filter(|u| u.owner().user_id() == Some(user))
            .collect();
        units.sort_by(|a, b| {
            a.ownership
                .owned_since
                .cmp(&b.ownership.owned_since)
                .then_with(|| a.id.cmp(&b.id))
        });
        Ok(units)
    }
}

fn creation_transfer_type(record: &AssetRecord) -> TransferType {
    match record.source_info.added_by {
        AddedBy::Admin => TransferType::AdminAdd,
        AddedBy::User => TransferType::UserReport,
    }
}

fn build_record(id: AssetId, checked: &CheckedUnit, now: Timestamp) -> AssetRecord {
    let source = &checked.source;
    AssetRecord {
        id,
        item_name: checked.item_name.clone(),
        category_id: checked.category_id.clone(),
        serial_number: checked.serial_number.clone(),
        phone_number: checked.phone_number.clone(),
        status_id: checked.status_id.clone(),
        condition_id: checked.condition_id.clone(),
        ownership: Ownership::new(checked.owner.clone(), now, source.assigned_by.clone()),
        source_info: SourceInfo {
            added_by: source.added_by,
            added_by_user_id: source.added_by_user_id.clone(),
            date_added: now,
            initial_owner_type: checked.owner.owner_type(),
            acquisition_method: source.acquisition_method(),
            notes: validation::optional_text(source.notes.as_deref()),
        },
        transfer_info: None,
    }
}
