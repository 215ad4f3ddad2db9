//! # Shared Types Crate
//!
//! Identifiers and ownership primitives used by every crate in the
//! inventory workspace.
//!
//! ## Design Principles
//!
//! - **Single Source of Truth**: Cross-crate types (ids, group keys, owner
//!   and transfer kinds) are defined here and nowhere else.
//! - **Opaque Identity**: Asset and archive ids are random UUIDs. Display
//!   sequence numbers are derived lazily, never allocated by scanning.
//! - **External References**: Status, condition and category ids point into
//!   configuration maintained outside the ledger; they are plain strings.

pub mod entities;
pub mod errors;

pub use entities::*;
pub use errors::*;
