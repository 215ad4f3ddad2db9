//! # Ports Layer
//!
//! Hexagonal architecture ports for the Asset Ownership Ledger.
//!
//! - `inbound` - Driving ports (API exposed to collaborators)
//! - `outbound` - Driven ports (storage, clock, configuration catalog, event sinks)

pub mod inbound;
pub mod outbound;
