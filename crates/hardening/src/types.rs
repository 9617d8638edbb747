//! Core types shared by the differ, auditor and applicator.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Which configuration a snapshot holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConfigKind {
    /// Active in-memory configuration
    Running,
    /// Configuration in non-volatile storage
    Startup,
}

impl ConfigKind {
    /// Exec command that prints this configuration.
    pub fn show_command(&self) -> &'static str {
        match self {
            Self::Running => "show running-config",
            Self::Startup => "show startup-config",
        }
    }

    /// Label used in diff headers.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Running => "Running-config",
            Self::Startup => "Startup-config",
        }
    }
}

impl fmt::Display for ConfigKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Running => f.write_str("running"),
            Self::Startup => f.write_str("startup"),
        }
    }
}

/// One configuration snapshot, as captured.
///
/// CRLF line endings are normalized to LF on construction; nothing changes
/// it afterwards.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ConfigText {
    text: String,
}

impl ConfigText {
    /// Capture a snapshot from raw device output.
    pub fn new(raw: impl Into<String>) -> Self {
        let raw = raw.into();
        let text = if raw.contains('\r') {
            raw.replace("\r\n", "\n").replace('\r', "\n")
        } else {
            raw
        };
        Self { text }
    }

    /// Iterate over lines in order.
    pub fn lines(&self) -> impl Iterator<Item = &str> {
        self.text.lines()
    }

    /// Number of lines.
    pub fn line_count(&self) -> usize {
        self.text.lines().count()
    }

    /// The full text, lines joined with `\n`.
    pub fn as_str(&self) -> &str {
        &self.text
    }

    /// Check if the snapshot has no content.
    pub fn is_empty(&self) -> bool {
        self.text.trim().is_empty()
    }
}

impl From<&str> for ConfigText {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for ConfigText {
    fn from(value: String) -> Self {
        Self::new(value)
    }
}
