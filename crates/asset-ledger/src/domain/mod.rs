//! # Domain Layer
//!
//! Pure domain logic for the Asset Ownership Ledger.
//! Nothing in here touches storage or the clock directly; callers pass
//! in records and timestamps.
//!
//! ## Modules
//!
//! - `asset` - Live unit records, ownership and provenance
//! - `ledger` - Append-only transfer ledger entries
//! - `archive` - Recycle bin snapshots and retention arithmetic
//! - `summary` - Aggregate group summaries and stock operations
//! - `projection` - Recompute of a group summary from its units
//! - `reconciliation` - Planning of stock syncs (grow or shrink)
//! - `validation` - Normalisation of serial numbers, phones and names
//! - `events` - Mutation events dispatched after each commit
//! - `value_objects` - Configuration and storage key layout
//! - `errors` - Domain error types

pub mod archive;
pub mod asset;
pub mod errors;
pub mod events;
pub mod ledger;
pub mod projection;
pub mod reconciliation;
pub mod summary;
pub mod validation;
pub mod value_objects;
