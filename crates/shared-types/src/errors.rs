//! # Error Types
//!
//! Errors raised while handling shared identifiers.

use thiserror::Error;

/// A string could not be turned into an identifier.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum IdentifierError {
    #[error("Malformed {kind}: {value:?}")]
    Malformed { kind: &'static str, value: String },
}
