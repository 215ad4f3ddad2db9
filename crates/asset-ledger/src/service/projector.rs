//! # Aggregate Projector
//!
//! The only component that writes group summaries outside a stock
//! operation. It re-reads the group's live units on every recompute, so a
//! lost or repeated event can never leave a summary permanently wrong: the
//! next recompute of the group repairs it.

use super::store::{RecordStore, WriteBatch};
use crate::domain::errors::LedgerError;
use crate::domain::events::LedgerEvent;
use crate::domain::projection::{project, RecomputeMode};
use crate::domain::summary::AggregateSummary;
use crate::ports::outbound::{KeyValueStore, LedgerEventHandler, TimeSource};
use shared_types::GroupKey;
use std::sync::Arc;
use tracing::{debug, warn};

/// Recomputes group summaries in response to ledger events.
pub struct AggregateProjector<KV, TS> {
    store: RecordStore<KV>,
    time_source: Arc<TS>,
    max_retries: u32,
}

impl<KV, TS> AggregateProjector<KV, TS>
where
    KV: KeyValueStore,
    TS: TimeSource,
{
    pub(crate) fn new(store: RecordStore<KV>, time_source: Arc<TS>, max_retries: u32) -> Self {
        Self {
            store,
            time_source,
            max_retries: max_retries.max(1),
        }
    }

    /// Rebuild and store the summary of `group`.
    ///
    /// The write is guarded on the summary version that was read, so two
    /// concurrent recomputes cannot overwrite each other's stock history.
    /// An unchanged summary is not rewritten.
    pub fn recompute(
        &self,
        group: &GroupKey,
        mode: RecomputeMode,
    ) -> Result<AggregateSummary, LedgerError> {
        for attempt in 1..=self.max_retries {
            let units: Vec<_> = self
                .store
                .group_units(group)?
                .into_iter()
                .map(|loaded| loaded.value)
                .collect();
            let previous = self.store.summary(group)?;
            let summary = project(
                group,
                &units,
                previous.as_ref().map(|p| &p.value),
                mode,
                self.time_source.now(),
            );

            if previous.as_ref().is_some_and(|p| p.value == summary) {
                return Ok(summary);
            }

            let mut batch = WriteBatch::unsequenced();
            batch.put_summary(previous.as_ref(), &summary)?;
            if self.store.commit(batch)? {
                debug!(
                    %group,
                    total = summary.total_quantity,
                    declared = summary.admin_defined_stock(),
                    "Summary recomputed"
                );
                return Ok(summary);
            }
            debug!(%group, attempt, "Summary changed underneath recompute, retrying");
        }

        warn!(%group, attempts = self.max_retries, "Giving up on summary recompute");
        Err(LedgerError::Persistence {
            message: format!(
                "summary of {} kept changing during {} recompute attempts",
                group, self.max_retries
            ),
        })
    }
}

impl<KV, TS> LedgerEventHandler for AggregateProjector<KV, TS>
where
    KV: KeyValueStore,
    TS: TimeSource,
{
    fn name(&self) -> &'static str {
        "aggregate-projector"
    }

    fn handle(&self, event: &LedgerEvent) -> Result<Vec<LedgerEvent>, LedgerError> {
        let Some(mode) = event.recompute_mode() else {
            return Ok(Vec::new());
        };
        let summary = self.recompute(event.group(), mode)?;
        Ok(vec![recomputed(summary)])
    }

    /// One recompute per group per round. A restore in the round keeps the
    /// group's declared stock as recorded.
    fn handle_all(&self, events: &[LedgerEvent]) -> Vec<LedgerEvent> {
        let mut pending: Vec<(&GroupKey, RecomputeMode)> = Vec::new();
        for event in events {
            let Some(mode) = event.recompute_mode() else {
                continue;
            };
            match pending.iter_mut().find(|(group, _)| *group == event.group()) {
                Some((_, existing)) if mode == RecomputeMode::TrustRecorded => *existing = mode,
                Some(_) => {}
                None => pending.push((event.group(), mode)),
            }
        }

        pending
            .into_iter()
            .filter_map(|(group, mode)| match self.recompute(group, mode) {
                Ok(summary) => Some(recomputed(summary)),
                Err(error) => {
                    warn!(%group, %error, "Summary recompute failed");
                    None
                }
            })
            .collect()
    }
}

fn recomputed(summary: AggregateSummary) -> LedgerEvent {
    LedgerEvent::SummaryRecomputed {
        group: summary.group,
        total: summary.total_quantity,
        available: summary.available_quantity,
        user_owned: summary.user_owned_quantity,
    }
}
