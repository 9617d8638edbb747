//! Errors in rule tables and command lists.
//!
//! The auditor and applicator never fail at run time; these errors are
//! raised when a rule table or command list is loaded.

use thiserror::Error;

/// A problem with a rule table or command list.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Error {
    /// Rule at this position has no name
    #[error("rule #{index} has an empty name")]
    EmptyRuleName {
        /// 1-based position in the table
        index: usize,
    },

    /// Rule substring is empty and would always pass
    #[error("rule '{name}' has an empty substring and would always pass")]
    EmptySubstring {
        /// Rule name
        name: String,
    },

    /// Two rules share a name
    #[error("duplicate rule name '{name}'")]
    DuplicateRule {
        /// Rule name
        name: String,
    },

    /// Command at this position is blank
    #[error("hardening command #{index} is empty")]
    EmptyCommand {
        /// 1-based position in the list
        index: usize,
    },
}

/// Result type for rule/command validation.
pub type Result<T> = std::result::Result<T, Error>;
