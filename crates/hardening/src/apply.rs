//! Best-effort application of configuration commands.
//!
//! Commands are sent in order inside configuration mode. A rejected command
//! is recorded and the next one is still sent; nothing is rolled back.

use crate::rules::redact_command;
use devicekit::Session;
use serde::Serialize;

/// Result of sending one command.
///
/// Secrets in the command are masked in both fields.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CommandOutcome {
    pub command: String,
    pub succeeded: bool,
    /// Device output on success, error message on failure
    pub output: String,
}

impl CommandOutcome {
    fn from_result(command: &str, result: devicekit::Result<String>) -> Self {
        let shown = redact_command(command);
        match result {
            Ok(output) => Self {
                command: shown,
                succeeded: true,
                output,
            },
            Err(e) => {
                let output = e.to_string().replace(command, &shown);
                Self {
                    command: shown,
                    succeeded: false,
                    output,
                }
            }
        }
    }
}

/// Everything an apply pass did.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ApplyReport {
    /// One outcome per command, in order
    pub outcomes: Vec<CommandOutcome>,
    /// Outcome of the persist command, if one was issued
    pub save: Option<CommandOutcome>,
    /// Failures entering or leaving configuration mode
    pub mode_errors: Vec<String>,
}

impl ApplyReport {
    pub fn succeeded_count(&self) -> usize {
        self.outcomes.iter().filter(|o| o.succeeded).count()
    }

    pub fn failed_count(&self) -> usize {
        self.outcomes.len() - self.succeeded_count()
    }

    /// Failed commands, in order.
    pub fn failures(&self) -> impl Iterator<Item = &CommandOutcome> {
        self.outcomes.iter().filter(|o| !o.succeeded)
    }

    /// Whether every command and the save succeeded.
    pub fn is_success(&self) -> bool {
        self.failed_count() == 0
            && self.mode_errors.is_empty()
            && self.save.as_ref().is_none_or(|s| s.succeeded)
    }
}

/// Receives progress while commands are applied.
pub trait ApplyObserver {
    /// Called before a command is sent
    fn on_command_start(&mut self, command: &str);

    /// Called after a command completes
    fn on_command_complete(&mut self, outcome: &CommandOutcome);
}

/// No-op observer
pub struct NoObserver;

impl ApplyObserver for NoObserver {
    fn on_command_start(&mut self, _command: &str) {}
    fn on_command_complete(&mut self, _outcome: &CommandOutcome) {}
}

/// Apply `commands` in configuration mode, then issue `save` once.
pub fn apply<S: Session + ?Sized>(
    session: &mut S,
    commands: &[String],
    save: Option<&str>,
) -> ApplyReport {
    apply_with_observer(session, commands, save, &mut NoObserver)
}

/// [`apply`] with progress callbacks.
pub fn apply_with_observer<S, O>(
    session: &mut S,
    commands: &[String],
    save: Option<&str>,
    observer: &mut O,
) -> ApplyReport
where
    S: Session + ?Sized,
    O: ApplyObserver + ?Sized,
{
    let mut report = ApplyReport::default();

    if let Err(e) = session.enter_config_mode() {
        log::warn!("Could not enter configuration mode on {}: {e}", session.host());
        report.mode_errors.push(format!("enter configuration mode: {e}"));
    }

    for command in commands {
        let shown = redact_command(command);
        log::info!("Applying command: {shown}");
        observer.on_command_start(&shown);

        let outcome = CommandOutcome::from_result(command, session.send_command(command));
        if outcome.succeeded {
            log::info!("  ok: {shown}");
        } else {
            log::warn!("  failed: {shown}: {}", outcome.output);
        }

        observer.on_command_complete(&outcome);
        report.outcomes.push(outcome);
    }

    if let Err(e) = session.exit_config_mode() {
        log::warn!("Could not leave configuration mode on {}: {e}", session.host());
        report.mode_errors.push(format!("leave configuration mode: {e}"));
    }

    if let Some(save) = save {
        log::info!("Saving configuration: {save}");
        let outcome = CommandOutcome::from_result(save, session.send_command(save));
        if !outcome.succeeded {
            log::warn!("Save failed: {}", outcome.output);
        }
        report.save = Some(outcome);
    }

    report
}
