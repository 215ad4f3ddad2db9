//! # Ledger Container
//!
//! Configuration and dependency wiring for the runtime.

pub mod config;
pub mod services;

pub use config::{ConfigError, RuntimeConfig};
pub use services::{ContainerError, LedgerContainer, RuntimeLedger};
