//! Line diff between two configuration snapshots.
//!
//! Alignment is a minimal edit script (Myers), so a line is only reported
//! as removed and re-added when no shorter alignment keeps it in place.
//! The pair is always aligned in the same orientation, whichever argument
//! comes first, so swapping the snapshots only swaps Added and Removed.

use crate::types::ConfigText;
use serde::{Deserialize, Serialize};
use similar::{Algorithm, ChangeTag, TextDiff};

/// Default number of context lines around a hunk.
pub const DEFAULT_CONTEXT: usize = 3;

/// One line of a diff.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "line", rename_all = "snake_case")]
pub enum DiffEntry {
    /// Only in the second snapshot
    Added(String),
    /// Only in the first snapshot
    Removed(String),
    /// In both, at matching position
    Context(String),
}

impl DiffEntry {
    /// The line text.
    pub fn line(&self) -> &str {
        match self {
            Self::Added(line) | Self::Removed(line) | Self::Context(line) => line,
        }
    }

    /// Check if this entry is an addition or removal.
    pub fn is_change(&self) -> bool {
        !matches!(self, Self::Context(_))
    }

    /// The same entry seen from the other side (Added ↔ Removed).
    pub fn inverted(&self) -> Self {
        match self {
            Self::Added(line) => Self::Removed(line.clone()),
            Self::Removed(line) => Self::Added(line.clone()),
            Self::Context(line) => Self::Context(line.clone()),
        }
    }
}

/// Compare two snapshots line by line.
///
/// Lines only in `a` are [`DiffEntry::Removed`], lines only in `b` are
/// [`DiffEntry::Added`], shared lines are [`DiffEntry::Context`]. Within a
/// changed block, lines of whichever snapshot sorts first come first.
/// `diff(b, a)` is `diff(a, b)` with every entry [inverted](DiffEntry::inverted).
pub fn diff(a: &ConfigText, b: &ConfigText) -> Vec<DiffEntry> {
    let a: Vec<&str> = a.lines().collect();
    let b: Vec<&str> = b.lines().collect();
    if a <= b {
        align(&a, &b)
    } else {
        align(&b, &a).iter().map(DiffEntry::inverted).collect()
    }
}

/// Entries for `old` → `new`; removals lead each changed block.
fn align(old: &[&str], new: &[&str]) -> Vec<DiffEntry> {
    let text_diff = TextDiff::configure()
        .algorithm(Algorithm::Myers)
        .diff_slices(old, new);

    let mut entries = Vec::with_capacity(old.len().max(new.len()));
    let mut added = Vec::new();
    for change in text_diff.iter_all_changes() {
        let line = change.value().to_string();
        match change.tag() {
            ChangeTag::Equal => {
                entries.append(&mut added);
                entries.push(DiffEntry::Context(line));
            }
            ChangeTag::Delete => entries.push(DiffEntry::Removed(line)),
            ChangeTag::Insert => added.push(DiffEntry::Added(line)),
        }
    }
    entries.append(&mut added);
    entries
}

/// Render a unified diff (`---`/`+++` headers, `@@` hunks).
///
/// Returns an empty string when the snapshots are identical.
pub fn unified(a: &ConfigText, b: &ConfigText, from: &str, to: &str, context: usize) -> String {
    let old: Vec<&str> = a.lines().collect();
    let new: Vec<&str> = b.lines().collect();
    let text_diff = TextDiff::configure()
        .algorithm(Algorithm::Myers)
        .diff_slices(&old, &new);

    text_diff
        .unified_diff()
        .context_radius(context)
        .missing_newline_hint(false)
        .header(from, to)
        .to_string()
}

/// Diff summary statistics
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct DiffSummary {
    /// Lines only in the second snapshot
    pub added: usize,
    /// Lines only in the first snapshot
    pub removed: usize,
    /// Shared lines
    pub context: usize,
}

impl DiffSummary {
    /// Create a summary from diff entries
    pub fn from_entries(entries: &[DiffEntry]) -> Self {
        let mut summary = Self::default();
        for entry in entries {
            match entry {
                DiffEntry::Added(_) => summary.added += 1,
                DiffEntry::Removed(_) => summary.removed += 1,
                DiffEntry::Context(_) => summary.context += 1,
            }
        }
        summary
    }

    /// Total number of changed lines
    pub fn total_changes(&self) -> usize {
        self.added + self.removed
    }

    /// Check if there are any changes
    pub fn has_changes(&self) -> bool {
        self.total_changes() > 0
    }
}
