//! Serializer Adapters
//!
//! Encoding of every value the ledger stores.

mod bincode;

pub use self::bincode::{decode, encode};
