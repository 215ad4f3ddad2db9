//! # Event Bus Adapter for the Asset Ledger
//!
//! Republishes committed ledger events on the shared event bus so that
//! collaborators (notifications, reporting, audit) never call into the
//! ledger core.
//!
//! ## Architecture
//!
//! ```text
//! [AssetLedgerService] ──dispatch──→ [LedgerBusAdapter] ──publish──→ [Event Bus]
//! ```
//!
//! ## Event Publications
//!
//! | Ledger event | Bus event(s) | Topic |
//! |--------------|--------------|-------|
//! | `UnitCreated` | `UnitCreated` | Units |
//! | `UnitTransferred` | `UnitTransferred` | Units |
//! | `UnitStatusChanged` | `UnitStatusChanged` | Units |
//! | `UnitArchived` | `UnitArchived` | Archive |
//! | `UnitRestored` | `UnitRestored` | Archive |
//! | `ArchivePurged` | `ArchivePurged` | Archive |
//! | `StockLevelChanged` | `StockLevelChanged`, plus `UnitsRemoved` when a shrink removed units | Stock |
//! | `SummaryRecomputed` | `SummaryRecomputed` | Projection |

mod adapter;

pub use adapter::{to_bus_events, LedgerBusAdapter};
