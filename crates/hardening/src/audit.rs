//! Hardening audit of a configuration snapshot.
//!
//! Each rule passes when its substring appears verbatim (case-sensitive)
//! anywhere in the configuration text.

use crate::error::{Error, Result};
use crate::types::ConfigText;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// A named check: the configuration must contain `must_contain`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HardeningRule {
    /// Display name, unique within a table
    pub name: String,
    /// Required substring
    pub must_contain: String,
}

impl HardeningRule {
    /// Create a rule.
    pub fn new(name: impl Into<String>, must_contain: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            must_contain: must_contain.into(),
        }
    }

    /// Check the rule against configuration text.
    ///
    /// An empty substring always matches.
    pub fn matches(&self, text: &str) -> bool {
        text.contains(self.must_contain.as_str())
    }
}

/// Outcome of one rule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RuleOutcome {
    pub name: String,
    pub must_contain: String,
    pub passed: bool,
}

/// Outcome of every rule, in rule-table order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct AuditResult {
    pub outcomes: Vec<RuleOutcome>,
}

impl AuditResult {
    /// Look up a rule's outcome by name.
    pub fn get(&self, name: &str) -> Option<bool> {
        self.outcomes.iter().find(|o| o.name == name).map(|o| o.passed)
    }

    pub fn len(&self) -> usize {
        self.outcomes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.outcomes.is_empty()
    }

    pub fn passed_count(&self) -> usize {
        self.outcomes.iter().filter(|o| o.passed).count()
    }

    pub fn failed_count(&self) -> usize {
        self.len() - self.passed_count()
    }

    /// Failed rules, in order.
    pub fn failures(&self) -> impl Iterator<Item = &RuleOutcome> {
        self.outcomes.iter().filter(|o| !o.passed)
    }

    pub fn all_passed(&self) -> bool {
        self.outcomes.iter().all(|o| o.passed)
    }
}

/// Evaluate `rules` against `config`. Pure and total.
pub fn audit(config: &ConfigText, rules: &[HardeningRule]) -> AuditResult {
    let text = config.as_str();
    let outcomes = rules
        .iter()
        .map(|rule| {
            let passed = rule.matches(text);
            log::debug!(
                "Rule '{}' ({:?}): {}",
                rule.name,
                rule.must_contain,
                if passed { "pass" } else { "fail" }
            );
            RuleOutcome {
                name: rule.name.clone(),
                must_contain: rule.must_contain.clone(),
                passed,
            }
        })
        .collect();

    AuditResult { outcomes }
}

/// Reject tables with blank names, empty substrings or duplicate names.
pub fn validate_rules(rules: &[HardeningRule]) -> Result<()> {
    let mut seen = HashSet::new();
    for (i, rule) in rules.iter().enumerate() {
        if rule.name.trim().is_empty() {
            return Err(Error::EmptyRuleName { index: i + 1 });
        }
        if rule.must_contain.is_empty() {
            return Err(Error::EmptySubstring {
                name: rule.name.clone(),
            });
        }
        if !seen.insert(rule.name.as_str()) {
            return Err(Error::DuplicateRule {
                name: rule.name.clone(),
            });
        }
    }
    Ok(())
}
