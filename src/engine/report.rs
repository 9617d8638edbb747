//! Console reporting for runs and offline commands.

use colored::Colorize;
use dialoguer::Confirm;
use hardening::{
    ApplyObserver, ApplyReport, AuditResult, CommandOutcome, ConfigKind, ConfigText,
    DEFAULT_CONTEXT, DiffEntry, DiffSummary, RuleOutcome,
};
use indicatif::{ProgressBar, ProgressStyle};
use std::path::Path;
use std::time::Duration;

use super::orchestrator::{RunObserver, RunReport, RunState, Step, StepError};
use crate::ui;

/// Diff header labels.
pub const RUNNING_LABEL: &str = "Running-config";
pub const STARTUP_LABEL: &str = "Startup-config";

// ============================================================================
// Shared Printers
// ============================================================================

/// Print a unified diff of `a` against `b` under `title`.
pub fn print_diff(title: &str, a: &ConfigText, b: &ConfigText, labels: (&str, &str), context: usize) {
    ui::section(title);
    let text = hardening::unified(a, b, labels.0, labels.1, context);
    if text.is_empty() {
        ui::dim("No differences");
        return;
    }
    for line in text.lines() {
        ui::diff_line(line);
    }

    let summary = DiffSummary::from_entries(&hardening::diff(a, b));
    println!();
    ui::dim(&format!(
        "{} added, {} removed",
        summary.added, summary.removed
    ));
}

/// Plain `[PASS] name` / `[FAIL] name` line.
pub fn audit_line(outcome: &RuleOutcome) -> String {
    let marker = if outcome.passed { "[PASS]" } else { "[FAIL]" };
    format!("{marker} {}", outcome.name)
}

/// Print one line per rule, in rule order.
pub fn print_audit(result: &AuditResult) {
    ui::section("Hardening Audit Results:");
    for outcome in &result.outcomes {
        let line = audit_line(outcome);
        if outcome.passed {
            println!("{}", line.green());
        } else {
            println!("{}", line.red());
        }
    }
    println!();
    ui::dim(&format!(
        "{}/{} rules passed",
        result.passed_count(),
        result.len()
    ));
}

/// Print the end-of-run summary.
pub fn print_summary(report: &RunReport) {
    ui::header("Summary");
    ui::kv("Host", &report.host);
    ui::kv("Reached", &report.reached.to_string());

    for (label, path) in [
        ("Running snapshot", &report.running_snapshot),
        ("Startup snapshot", &report.startup_snapshot),
    ] {
        if let Some(path) = path {
            ui::kv(label, &path.display().to_string());
        }
    }

    if let Some(summary) = &report.diff_summary {
        ui::kv(
            "Diff",
            &format!("{} added, {} removed", summary.added, summary.removed),
        );
    }
    if let Some(audit) = &report.audit {
        ui::kv(
            "Audit",
            &format!("{} passed, {} failed", audit.passed_count(), audit.failed_count()),
        );
    }
    match (&report.hardening, report.hardening_confirmed) {
        (Some(hardening), _) => ui::kv(
            "Hardening",
            &format!(
                "{}/{} commands applied",
                hardening.succeeded_count(),
                hardening.outcomes.len()
            ),
        ),
        (None, Some(false)) => ui::kv("Hardening", "skipped (not confirmed)"),
        (None, _) => {}
    }
    if !report.step_errors.is_empty() {
        ui::kv("Step errors", &report.step_errors.len().to_string());
    }
}

// ============================================================================
// Console Observer
// ============================================================================

/// Prints run progress and asks before hardening.
pub struct ConsoleObserver {
    host: String,
    assume_yes: bool,
    show_spinner: bool,
    spinner: Option<ProgressBar>,
}

impl ConsoleObserver {
    /// `assume_yes` skips the confirmation prompt; `quiet` hides spinners.
    pub fn new(host: impl Into<String>, assume_yes: bool, quiet: bool) -> Self {
        Self {
            host: host.into(),
            assume_yes,
            show_spinner: !quiet && console::user_attended(),
            spinner: None,
        }
    }

    fn start_spinner(&mut self, message: String) {
        self.stop_spinner();
        if !self.show_spinner {
            return;
        }
        let spinner = ProgressBar::new_spinner();
        spinner.set_style(
            ProgressStyle::default_spinner()
                .template("{spinner:.blue} {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_spinner()),
        );
        spinner.set_message(message);
        spinner.enable_steady_tick(Duration::from_millis(100));
        self.spinner = Some(spinner);
    }

    fn stop_spinner(&mut self) {
        if let Some(spinner) = self.spinner.take() {
            spinner.finish_and_clear();
        }
    }
}

impl Drop for ConsoleObserver {
    fn drop(&mut self) {
        self.stop_spinner();
    }
}

impl ApplyObserver for ConsoleObserver {
    fn on_command_start(&mut self, command: &str) {
        self.stop_spinner();
        println!("Applying command: {command}");
    }

    fn on_command_complete(&mut self, outcome: &CommandOutcome) {
        if !outcome.succeeded {
            ui::warn(&format!("  {} failed: {}", outcome.command, outcome.output));
        }
    }
}

impl RunObserver for ConsoleObserver {
    fn on_step_start(&mut self, step: Step) {
        match step {
            Step::Connect => self.start_spinner(format!("Connecting to {}...", self.host)),
            Step::Reconnect => self.start_spinner(format!("Reconnecting to {}...", self.host)),
            Step::Privileged => self.start_spinner("Entering privileged mode...".to_string()),
            Step::FetchRunning => self.start_spinner("Fetching running-config...".to_string()),
            Step::FetchStartup => self.start_spinner("Fetching startup-config...".to_string()),
            Step::Harden => {
                self.stop_spinner();
                ui::section("Applying hardening configuration:");
            }
            Step::Syslog => self.start_spinner("Configuring syslog...".to_string()),
            _ => {}
        }
    }

    fn on_state(&mut self, state: RunState) {
        self.stop_spinner();
        match state {
            RunState::Connected => ui::success(&format!("Connected to {}", self.host)),
            RunState::Privileged => ui::success("Entered privileged mode"),
            RunState::Disconnected => ui::dim(&format!("Disconnected from {}", self.host)),
            _ => {}
        }
    }

    fn on_step_error(&mut self, error: &StepError) {
        self.stop_spinner();
        ui::warn(&error.to_string());
        if let Some(advice) = error.advice {
            ui::dim(advice);
        }
    }

    fn on_snapshot(&mut self, kind: ConfigKind, path: &Path) {
        self.stop_spinner();
        ui::success(&format!("Saved {kind} configuration to {}", path.display()));
    }

    fn on_diff(&mut self, running: &ConfigText, startup: &ConfigText, _entries: &[DiffEntry]) {
        self.stop_spinner();
        print_diff(
            "Differences between Running and Startup Configs:",
            running,
            startup,
            (RUNNING_LABEL, STARTUP_LABEL),
            DEFAULT_CONTEXT,
        );
    }

    fn on_audit(&mut self, result: &AuditResult) {
        self.stop_spinner();
        print_audit(result);
    }

    fn confirm_hardening(&mut self, commands: &[String]) -> anyhow::Result<bool> {
        self.stop_spinner();
        if self.assume_yes {
            return Ok(true);
        }
        if !console::user_attended() {
            ui::warn("Not running in a terminal; pass --yes to apply hardening");
            return Ok(false);
        }

        ui::section("Hardening commands:");
        for (i, command) in commands.iter().enumerate() {
            ui::item(i + 1, &hardening::redact_command(command));
        }
        println!();

        let confirmed = Confirm::new()
            .with_prompt(format!(
                "Apply {} commands to {}?",
                commands.len(),
                self.host
            ))
            .default(false)
            .interact()?;
        Ok(confirmed)
    }

    fn on_hardening_complete(&mut self, report: &ApplyReport) {
        println!();
        if report.failed_count() == 0 && report.mode_errors.is_empty() {
            ui::success("Hardening configuration applied successfully.");
        } else {
            ui::warn(&format!(
                "Hardening configuration applied with errors ({} of {} commands failed).",
                report.failed_count(),
                report.outcomes.len()
            ));
        }
        if let Some(save) = &report.save {
            if save.succeeded {
                ui::success(&format!("Configuration saved ({})", save.command));
            } else {
                ui::warn(&format!("Save failed: {}", save.output));
            }
        }
    }

    fn on_syslog(&mut self, server: &str, report: &ApplyReport) {
        self.stop_spinner();
        if report.is_success() {
            ui::success(&format!("Syslog configured to send logs to {server}"));
        } else {
            ui::warn(&format!("Could not configure syslog server {server}"));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_audit_line() {
        let result = hardening::audit(
            &ConfigText::new("ip ssh version 2\nno service telnet\n"),
            &hardening::default_rules(),
        );
        let lines: Vec<String> = result.outcomes.iter().map(audit_line).collect();
        assert_eq!(lines[0], "[PASS] SSH enabled");
        assert_eq!(lines[1], "[PASS] Telnet disabled");
        assert_eq!(lines[2], "[FAIL] Password encryption");
        assert_eq!(lines.len(), 7);
    }

    #[test]
    fn test_assume_yes_confirms_without_prompt() {
        let mut observer = ConsoleObserver::new("r1", true, true);
        assert!(observer.confirm_hardening(&["ip ssh version 2".to_string()]).unwrap());
    }
}
