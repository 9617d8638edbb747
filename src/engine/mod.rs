//! Execution engine for netharden
//!
//! The engine orchestrates one run against one device:
//! 1. Snapshot - Fetch and save running and startup configurations
//! 2. Compare - Diff the snapshots and audit the running configuration
//! 3. Harden - Apply commands, save, configure syslog

pub mod orchestrator;
pub mod report;
pub mod snapshot;

pub use orchestrator::{RunPlan, RunReport, run};
pub use report::ConsoleObserver;
