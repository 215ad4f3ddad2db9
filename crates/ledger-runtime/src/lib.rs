//! # Ledger Runtime Library
//!
//! Hosts the asset ledger as a long-running process. The `main.rs` binary is
//! a thin shell over the pieces exposed here so they can be tested.
//!
//! ## Structure
//!
//! - `container/` - configuration and dependency wiring
//! - `tasks/` - background tasks (retention purge, audit log)
//! - `runtime` - startup and graceful shutdown
//!
//! ```text
//! ┌──────────────┐  LedgerEvent   ┌───────────────┐  InventoryEvent  ┌───────────┐
//! │ AssetLedger  │ ─────────────→ │ LedgerBus     │ ───────────────→ │ Event Bus │
//! │   Service    │                │   Adapter     │                  └─────┬─────┘
//! └──────▲───────┘                └───────────────┘                        │
//!        │ purge_expired()                                                 ↓
//! ┌──────┴───────┐                                                 ┌───────────┐
//! │  Purge Task  │                                                 │ Audit Log │
//! └──────────────┘                                                 └───────────┘
//! ```

#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

pub mod container;
pub mod runtime;
pub mod tasks;

pub use container::{ConfigError, ContainerError, LedgerContainer, RuntimeConfig};
pub use runtime::LedgerRuntime;
