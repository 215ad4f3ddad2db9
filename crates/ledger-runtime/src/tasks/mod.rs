//! # Background Tasks
//!
//! Long-running tasks spawned by the runtime. Each stops when the shutdown
//! watch flips to `true`.

pub mod audit;
pub mod purge;

pub use audit::run_audit_log;
pub use purge::{run_purge_loop, sweep_once};
