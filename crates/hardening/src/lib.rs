//! # hardening
//!
//! Configuration diff, audit and hardening for network devices.
//!
//! This crate provides:
//! - [`diff`]: line diff between two configuration snapshots
//! - [`audit`]: substring rules evaluated against a snapshot
//! - [`apply`]: best-effort application of commands followed by one save
//! - The built-in Cisco IOS rule table and command list
//!
//! The differ and auditor are pure; only the applicator talks to a device,
//! through [`devicekit::Session`].
//!
//! ## Example
//!
//! ```
//! use hardening::{ConfigText, audit, default_rules, diff, DiffSummary};
//!
//! let running = ConfigText::new("ip ssh version 2\nno service telnet\n");
//! let startup = ConfigText::new("ip ssh version 2\n");
//!
//! let summary = DiffSummary::from_entries(&diff(&running, &startup));
//! assert_eq!(summary.removed, 1);
//!
//! let result = audit(&running, &default_rules());
//! assert_eq!(result.passed_count(), 2);
//! ```

#![warn(clippy::all)]

pub mod apply;
pub mod audit;
pub mod diff;
pub mod error;
pub mod rules;
pub mod types;

pub use apply::{ApplyObserver, ApplyReport, CommandOutcome, NoObserver, apply, apply_with_observer};
pub use audit::{AuditResult, HardeningRule, RuleOutcome, audit, validate_rules};
pub use diff::{DEFAULT_CONTEXT, DiffEntry, DiffSummary, diff, unified};
pub use error::{Error, Result};
pub use rules::{
    DEFAULT_SAVE_COMMAND, default_commands, default_rules, redact_command, syslog_command,
    validate_commands, with_enable_secret,
};
pub use types::{ConfigKind, ConfigText};
