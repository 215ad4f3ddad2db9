//! # Asset Ledger Test Suite
//!
//! ## Structure
//!
//! ```text
//! tests/
//! ├── src/integration/
//! │   ├── flows.rs        # End-to-end ledger flows through the bus
//! │   ├── concurrency.rs  # Racing writers against one store
//! │   └── persistence.rs  # File-backed store across restarts
//! └── benches/
//!     └── ledger_benchmarks.rs
//! ```
//!
//! ## Running Tests
//!
//! ```bash
//! cargo test -p ledger-tests
//! cargo test -p ledger-tests integration::concurrency
//! cargo bench -p ledger-tests
//! ```

#![allow(dead_code)]

pub mod integration;
