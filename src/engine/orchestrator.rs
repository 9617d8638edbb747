//! Run orchestration.
//!
//! One run owns one device session and moves it through
//! `Disconnected → Connected → Privileged → AuditedRunning → Hardened →
//! SyslogConfigured → Disconnected`. Failing to connect or to enter
//! privileged mode, at the start or again before hardening, ends the run in
//! `Failed`; every other failure is recorded in the report and the run
//! continues. The session is closed on every exit
//! path, including panics.

use anyhow::Context;
use chrono::{DateTime, Local};
use devicekit::Session;
use hardening::{
    ApplyObserver, ApplyReport, AuditResult, ConfigKind, ConfigText, DiffEntry, DiffSummary,
    HardeningRule,
};
use serde::Serialize;
use std::fmt;
use std::ops::{Deref, DerefMut};
use std::path::{Path, PathBuf};

use super::snapshot::{self, SnapshotPaths};

// ============================================================================
// States and Steps
// ============================================================================

/// Where a run is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RunState {
    Disconnected,
    Connected,
    Privileged,
    AuditedRunning,
    Hardened,
    SyslogConfigured,
    Failed,
}

impl fmt::Display for RunState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Disconnected => "disconnected",
            Self::Connected => "connected",
            Self::Privileged => "privileged",
            Self::AuditedRunning => "audited",
            Self::Hardened => "hardened",
            Self::SyslogConfigured => "syslog configured",
            Self::Failed => "failed",
        };
        f.write_str(s)
    }
}

/// A unit of work within a run, used to attribute errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Step {
    Connect,
    Privileged,
    FetchRunning,
    FetchStartup,
    SaveRunning,
    SaveStartup,
    Diff,
    Audit,
    Reconnect,
    Confirm,
    Harden,
    Syslog,
}

impl Step {
    fn fetch(kind: ConfigKind) -> Self {
        match kind {
            ConfigKind::Running => Self::FetchRunning,
            ConfigKind::Startup => Self::FetchStartup,
        }
    }

    fn save(kind: ConfigKind) -> Self {
        match kind {
            ConfigKind::Running => Self::SaveRunning,
            ConfigKind::Startup => Self::SaveStartup,
        }
    }

    /// Human-readable description.
    pub fn description(&self) -> &'static str {
        match self {
            Self::Connect => "connect",
            Self::Privileged => "enter privileged mode",
            Self::FetchRunning => "fetch running-config",
            Self::FetchStartup => "fetch startup-config",
            Self::SaveRunning => "save running-config snapshot",
            Self::SaveStartup => "save startup-config snapshot",
            Self::Diff => "diff configurations",
            Self::Audit => "audit running-config",
            Self::Reconnect => "reconnect",
            Self::Confirm => "confirm hardening",
            Self::Harden => "apply hardening",
            Self::Syslog => "configure syslog",
        }
    }
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.description())
    }
}

/// A failed step.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StepError {
    pub step: Step,
    pub message: String,
    /// Suggested fix, for device errors
    #[serde(skip_serializing_if = "Option::is_none")]
    pub advice: Option<&'static str>,
}

impl StepError {
    pub fn new(step: Step, message: impl Into<String>) -> Self {
        Self {
            step,
            message: message.into(),
            advice: None,
        }
    }

    fn device(step: Step, error: &devicekit::Error) -> Self {
        Self {
            step,
            message: error.to_string(),
            advice: Some(error.category().advice()),
        }
    }
}

impl fmt::Display for StepError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.step, self.message)
    }
}

// ============================================================================
// Plan, Observer, Report
// ============================================================================

/// What a run does. Built once from configuration.
#[derive(Debug, Clone)]
pub struct RunPlan {
    pub rules: Vec<HardeningRule>,
    pub commands: Vec<String>,
    pub save_command: Option<String>,
    pub syslog_server: Option<String>,
    /// Snapshot files to write; `None` skips writing
    pub snapshots: Option<SnapshotPaths>,
    /// Apply hardening and syslog after the audit
    pub harden: bool,
}

/// Receives run events. Also receives per-command progress while
/// hardening is applied.
pub trait RunObserver: ApplyObserver {
    /// A step that talks to the device is about to start
    fn on_step_start(&mut self, _step: Step) {}

    /// The run moved to a new state
    fn on_state(&mut self, _state: RunState) {}

    /// A step failed and the run continues
    fn on_step_error(&mut self, _error: &StepError) {}

    fn on_snapshot(&mut self, _kind: ConfigKind, _path: &Path) {}

    fn on_diff(&mut self, _running: &ConfigText, _startup: &ConfigText, _entries: &[DiffEntry]) {}

    fn on_audit(&mut self, _result: &AuditResult) {}

    /// Ask whether to apply `commands`; `false` skips hardening and syslog
    fn confirm_hardening(&mut self, commands: &[String]) -> anyhow::Result<bool>;

    fn on_hardening_complete(&mut self, _report: &ApplyReport) {}

    fn on_syslog(&mut self, _server: &str, _report: &ApplyReport) {}
}

/// Everything a run produced.
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub host: String,
    pub started_at: DateTime<Local>,
    /// Terminal state: `disconnected` or `failed`
    pub state: RunState,
    /// Last state reached before the terminal one
    pub reached: RunState,
    pub running_snapshot: Option<PathBuf>,
    pub startup_snapshot: Option<PathBuf>,
    pub diff: Option<Vec<DiffEntry>>,
    pub diff_summary: Option<DiffSummary>,
    pub audit: Option<AuditResult>,
    pub hardening_confirmed: Option<bool>,
    pub hardening: Option<ApplyReport>,
    pub syslog: Option<ApplyReport>,
    pub step_errors: Vec<StepError>,
    pub fatal: Option<StepError>,
}

impl RunReport {
    fn new(host: String) -> Self {
        Self {
            host,
            started_at: Local::now(),
            state: RunState::Disconnected,
            reached: RunState::Disconnected,
            running_snapshot: None,
            startup_snapshot: None,
            diff: None,
            diff_summary: None,
            audit: None,
            hardening_confirmed: None,
            hardening: None,
            syslog: None,
            step_errors: Vec::new(),
            fatal: None,
        }
    }

    pub fn is_fatal(&self) -> bool {
        self.fatal.is_some()
    }

    /// No fatal error and no step errors.
    pub fn is_clean(&self) -> bool {
        !self.is_fatal() && self.step_errors.is_empty()
    }

    /// Write the report as pretty JSON.
    pub fn write_json(&self, path: &Path) -> anyhow::Result<()> {
        let json = serde_json::to_string_pretty(self).context("Failed to serialize run report")?;
        std::fs::write(path, json)
            .with_context(|| format!("Could not write report: {}", path.display()))
    }
}

// ============================================================================
// Session Guard
// ============================================================================

/// Disconnects the session when dropped.
struct SessionGuard<'a, S: Session + ?Sized> {
    session: &'a mut S,
    closed: bool,
}

impl<'a, S: Session + ?Sized> SessionGuard<'a, S> {
    fn new(session: &'a mut S) -> Self {
        Self {
            session,
            closed: false,
        }
    }

    fn close(&mut self) {
        if !self.closed {
            log::debug!("Closing session to {}", self.session.host());
            self.session.disconnect();
            self.closed = true;
        }
    }
}

impl<S: Session + ?Sized> Deref for SessionGuard<'_, S> {
    type Target = S;

    fn deref(&self) -> &S {
        &*self.session
    }
}

impl<S: Session + ?Sized> DerefMut for SessionGuard<'_, S> {
    fn deref_mut(&mut self) -> &mut S {
        &mut *self.session
    }
}

impl<S: Session + ?Sized> Drop for SessionGuard<'_, S> {
    fn drop(&mut self) {
        self.close();
    }
}

// ============================================================================
// Run
// ============================================================================

/// Execute `plan` against `session`.
///
/// Never fails: a fatal error is recorded in [`RunReport::fatal`] and the
/// report's state is [`RunState::Failed`].
pub fn run<S, O>(session: &mut S, plan: &RunPlan, observer: &mut O) -> RunReport
where
    S: Session + ?Sized,
    O: RunObserver + ?Sized,
{
    let host = session.host().to_string();
    let mut run = Run {
        session: SessionGuard::new(session),
        plan,
        observer,
        report: RunReport::new(host),
    };

    if let Err(fatal) = run.execute() {
        run.fail(fatal);
    }
    run.finish()
}

struct Run<'a, S: Session + ?Sized, O: RunObserver + ?Sized> {
    session: SessionGuard<'a, S>,
    plan: &'a RunPlan,
    observer: &'a mut O,
    report: RunReport,
}

impl<S: Session + ?Sized, O: RunObserver + ?Sized> Run<'_, S, O> {
    fn execute(&mut self) -> Result<(), StepError> {
        self.open(Step::Connect)?;
        self.capture();
        self.transition(RunState::AuditedRunning);

        if !self.plan.harden {
            return Ok(());
        }

        if !self.session.is_connected() {
            log::warn!("Session to {} was closed, reconnecting", self.report.host);
            self.open(Step::Reconnect)?;
        }

        if !self.confirm() {
            return Ok(());
        }

        self.harden();

        let plan = self.plan;
        if let Some(server) = plan.syslog_server.as_deref() {
            self.configure_syslog(server);
        }
        Ok(())
    }

    /// Connect and enter privileged mode. Both failures are fatal.
    fn open(&mut self, connect_step: Step) -> Result<(), StepError> {
        self.observer.on_step_start(connect_step);
        self.session
            .connect()
            .map_err(|e| StepError::device(connect_step, &e))?;
        log::info!("Connected to {}", self.report.host);
        self.transition(RunState::Connected);

        self.observer.on_step_start(Step::Privileged);
        self.session
            .enter_privileged()
            .map_err(|e| StepError::device(Step::Privileged, &e))?;
        log::info!("Entered privileged mode on {}", self.report.host);
        self.transition(RunState::Privileged);
        Ok(())
    }

    /// Fetch both configurations, save them, diff and audit.
    fn capture(&mut self) {
        let running = self.fetch(ConfigKind::Running);
        let startup = self.fetch(ConfigKind::Startup);

        match (&running, &startup) {
            (Some(running), Some(startup)) => {
                let entries = hardening::diff(running, startup);
                let summary = DiffSummary::from_entries(&entries);
                log::info!(
                    "Diff: {} added, {} removed, {} unchanged",
                    summary.added,
                    summary.removed,
                    summary.context
                );
                self.observer.on_diff(running, startup, &entries);
                self.report.diff_summary = Some(summary);
                self.report.diff = Some(entries);
            }
            _ => self.step_error(StepError::new(
                Step::Diff,
                "skipped, both configurations are needed",
            )),
        }

        match &running {
            Some(running) => {
                let result = hardening::audit(running, &self.plan.rules);
                log::info!(
                    "Audit: {} passed, {} failed",
                    result.passed_count(),
                    result.failed_count()
                );
                self.observer.on_audit(&result);
                self.report.audit = Some(result);
            }
            None => self.step_error(StepError::new(
                Step::Audit,
                "skipped, running configuration unavailable",
            )),
        }
    }

    fn fetch(&mut self, kind: ConfigKind) -> Option<ConfigText> {
        if !self.resume() {
            return None;
        }

        let step = Step::fetch(kind);
        self.observer.on_step_start(step);

        let output = match self.session.send_command(kind.show_command()) {
            Ok(output) => output,
            Err(e) => {
                self.step_error(StepError::device(step, &e));
                return None;
            }
        };

        let config = ConfigText::new(output);
        log::info!("Fetched {kind} configuration ({} lines)", config.line_count());

        let plan = self.plan;
        if let Some(paths) = &plan.snapshots {
            self.save_snapshot(kind, paths.path(kind), &config);
        }
        Some(config)
    }

    /// Reopen a session that dropped during capture, e.g. after a timeout.
    /// Unlike the reconnect before hardening, failing here is a step error.
    fn resume(&mut self) -> bool {
        if self.session.is_connected() {
            return true;
        }
        log::warn!("Session to {} was closed, reconnecting", self.report.host);
        match self.open(Step::Reconnect) {
            Ok(()) => true,
            Err(e) => {
                self.step_error(e);
                false
            }
        }
    }

    fn save_snapshot(&mut self, kind: ConfigKind, path: &Path, config: &ConfigText) {
        if let Err(e) = snapshot::write(path, config) {
            self.step_error(StepError::new(Step::save(kind), format!("{e:#}")));
            return;
        }

        let saved = Some(path.to_path_buf());
        match kind {
            ConfigKind::Running => self.report.running_snapshot = saved,
            ConfigKind::Startup => self.report.startup_snapshot = saved,
        }
        self.observer.on_snapshot(kind, path);
    }

    fn confirm(&mut self) -> bool {
        let confirmed = match self.observer.confirm_hardening(&self.plan.commands) {
            Ok(confirmed) => confirmed,
            Err(e) => {
                self.step_error(StepError::new(Step::Confirm, format!("{e:#}")));
                false
            }
        };
        if !confirmed {
            log::info!("Hardening not confirmed, skipping hardening and syslog");
        }
        self.report.hardening_confirmed = Some(confirmed);
        confirmed
    }

    fn harden(&mut self) {
        let plan = self.plan;
        self.observer.on_step_start(Step::Harden);

        let result = hardening::apply_with_observer(
            &mut *self.session,
            &plan.commands,
            plan.save_command.as_deref(),
            &mut *self.observer,
        );

        for failed in result.failures() {
            self.step_error(StepError::new(
                Step::Harden,
                format!("'{}' failed: {}", failed.command, failed.output),
            ));
        }
        for message in &result.mode_errors {
            self.step_error(StepError::new(Step::Harden, message.clone()));
        }
        if let Some(save) = result.save.as_ref().filter(|s| !s.succeeded) {
            self.step_error(StepError::new(
                Step::Harden,
                format!("'{}' failed: {}", save.command, save.output),
            ));
        }

        self.observer.on_hardening_complete(&result);
        self.report.hardening = Some(result);
        self.transition(RunState::Hardened);
    }

    fn configure_syslog(&mut self, server: &str) {
        self.observer.on_step_start(Step::Syslog);
        let command = hardening::syslog_command(server);
        let result = hardening::apply(&mut *self.session, &[command], None);

        let succeeded = result.is_success();
        if !succeeded {
            let message = result
                .failures()
                .map(|o| o.output.clone())
                .chain(result.mode_errors.iter().cloned())
                .collect::<Vec<_>>()
                .join("; ");
            self.step_error(StepError::new(Step::Syslog, message));
        }

        self.observer.on_syslog(server, &result);
        self.report.syslog = Some(result);
        if succeeded {
            self.transition(RunState::SyslogConfigured);
        }
    }

    fn step_error(&mut self, error: StepError) {
        log::warn!("{error}");
        self.observer.on_step_error(&error);
        self.report.step_errors.push(error);
    }

    fn fail(&mut self, error: StepError) {
        log::error!("Run against {} failed: {error}", self.report.host);
        self.report.fatal = Some(error);
        self.transition(RunState::Failed);
    }

    fn transition(&mut self, state: RunState) {
        log::debug!("State: {} -> {state}", self.report.state);
        if !matches!(state, RunState::Disconnected | RunState::Failed) {
            self.report.reached = state;
        }
        self.report.state = state;
        self.observer.on_state(state);
    }

    fn finish(mut self) -> RunReport {
        self.session.close();
        if self.report.state != RunState::Failed {
            self.transition(RunState::Disconnected);
        }
        self.report
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use devicekit::{Call, MockSession};
    use hardening::CommandOutcome;
    use std::panic::{AssertUnwindSafe, catch_unwind};
    use tempfile::TempDir;

    const RUNNING: &str = "\
hostname R1
!
service password-encryption
!
ip ssh version 2
!
line vty 0 4
 login local
 transport input ssh
!
end
";

    fn startup() -> String {
        RUNNING.replace("ip ssh version 2\n", "ip ssh version 2\nntp server 192.168.1.100\n")
    }

    fn device() -> MockSession {
        MockSession::new("r1")
            .with_response("show running-config", RUNNING)
            .with_response("show startup-config", startup())
    }

    fn plan(harden: bool) -> RunPlan {
        RunPlan {
            rules: hardening::default_rules(),
            commands: vec![
                "ip ssh version 2".to_string(),
                "no service telnet".to_string(),
                "logging buffered".to_string(),
            ],
            save_command: Some("write memory".to_string()),
            syslog_server: Some("192.168.1.100".to_string()),
            snapshots: None,
            harden,
        }
    }

    /// Confirms everything, reports nothing.
    struct AutoConfirm;

    impl ApplyObserver for AutoConfirm {
        fn on_command_start(&mut self, _command: &str) {}
        fn on_command_complete(&mut self, _outcome: &CommandOutcome) {}
    }

    impl RunObserver for AutoConfirm {
        fn confirm_hardening(&mut self, _commands: &[String]) -> anyhow::Result<bool> {
            Ok(true)
        }
    }

    #[derive(Default)]
    struct Recorder {
        decline: bool,
        states: Vec<RunState>,
        errors: Vec<Step>,
        applied: Vec<String>,
        confirm_asked: bool,
    }

    impl ApplyObserver for Recorder {
        fn on_command_start(&mut self, command: &str) {
            self.applied.push(command.to_string());
        }
        fn on_command_complete(&mut self, _outcome: &CommandOutcome) {}
    }

    impl RunObserver for Recorder {
        fn on_state(&mut self, state: RunState) {
            self.states.push(state);
        }
        fn on_step_error(&mut self, error: &StepError) {
            self.errors.push(error.step);
        }
        fn confirm_hardening(&mut self, _commands: &[String]) -> anyhow::Result<bool> {
            self.confirm_asked = true;
            Ok(!self.decline)
        }
    }

    #[test]
    fn test_connect_failure_is_fatal_and_sends_nothing() {
        let mut session = device().refuse_connect();
        let report = run(&mut session, &plan(true), &mut AutoConfirm);

        assert!(session.commands().is_empty());
        assert_eq!(report.state, RunState::Failed);
        assert_eq!(report.fatal.as_ref().map(|f| f.step), Some(Step::Connect));
        assert!(report.audit.is_none());
        assert_eq!(session.calls(), &[Call::Connect, Call::Disconnect]);
    }

    #[test]
    fn test_privileged_failure_is_fatal() {
        let mut session = device().refuse_enable();
        let mut recorder = Recorder::default();
        let report = run(&mut session, &plan(true), &mut recorder);

        assert!(report.is_fatal());
        assert_eq!(report.fatal.as_ref().map(|f| f.step), Some(Step::Privileged));
        assert_eq!(report.reached, RunState::Connected);
        assert!(session.commands().is_empty());
        assert_eq!(session.calls().last(), Some(&Call::Disconnect));
        assert_eq!(recorder.states, vec![RunState::Connected, RunState::Failed]);
        assert!(!recorder.confirm_asked);
    }

    #[test]
    fn test_full_run() {
        let temp = TempDir::new().unwrap();
        let mut run_plan = plan(true);
        run_plan.snapshots = Some(SnapshotPaths::new(
            temp.path(),
            "running_config.txt",
            "startup_config.txt",
        ));

        let mut session = device();
        let mut recorder = Recorder::default();
        let report = run(&mut session, &run_plan, &mut recorder);

        assert!(report.is_clean(), "{:?}", report.step_errors);
        assert_eq!(report.state, RunState::Disconnected);
        assert_eq!(report.reached, RunState::SyslogConfigured);
        assert_eq!(
            recorder.states,
            vec![
                RunState::Connected,
                RunState::Privileged,
                RunState::AuditedRunning,
                RunState::Hardened,
                RunState::SyslogConfigured,
                RunState::Disconnected,
            ]
        );

        assert_eq!(
            std::fs::read_to_string(temp.path().join("running_config.txt")).unwrap(),
            RUNNING
        );
        assert_eq!(
            std::fs::read_to_string(temp.path().join("startup_config.txt")).unwrap(),
            startup()
        );

        let summary = report.diff_summary.unwrap();
        assert_eq!(summary.added, 1);
        assert_eq!(summary.removed, 0);
        let added: Vec<&DiffEntry> = report
            .diff
            .as_ref()
            .unwrap()
            .iter()
            .filter(|e| matches!(e, DiffEntry::Added(_)))
            .collect();
        assert_eq!(added, vec![&DiffEntry::Added("ntp server 192.168.1.100".to_string())]);

        let audit = report.audit.as_ref().unwrap();
        assert_eq!(audit.len(), 7);
        assert_eq!(audit.get("SSH enabled"), Some(true));
        assert_eq!(audit.get("NTP configured"), Some(false));

        assert_eq!(
            session.commands(),
            vec![
                "show running-config",
                "show startup-config",
                "configure terminal",
                "ip ssh version 2",
                "no service telnet",
                "logging buffered",
                "end",
                "write memory",
                "configure terminal",
                "logging 192.168.1.100",
                "end",
            ]
        );
        assert_eq!(recorder.applied.len(), 3);
        assert_eq!(session.calls().last(), Some(&Call::Disconnect));
        assert!(!session.is_connected());
    }

    #[test]
    fn test_failed_command_is_not_fatal() {
        let mut session = device().failing_command("no service telnet");
        let mut recorder = Recorder::default();
        let report = run(&mut session, &plan(true), &mut recorder);

        assert!(!report.is_fatal());
        assert_eq!(report.state, RunState::Disconnected);
        let hardening = report.hardening.as_ref().unwrap();
        assert_eq!(hardening.outcomes.len(), 3);
        assert!(!hardening.outcomes[1].succeeded);
        assert!(hardening.outcomes[2].succeeded);
        assert_eq!(recorder.errors, vec![Step::Harden]);
        assert_eq!(report.reached, RunState::SyslogConfigured);
    }

    #[test]
    fn test_declined_confirmation_skips_hardening() {
        let mut session = device();
        let mut recorder = Recorder {
            decline: true,
            ..Default::default()
        };
        let report = run(&mut session, &plan(true), &mut recorder);

        assert!(recorder.confirm_asked);
        assert_eq!(report.hardening_confirmed, Some(false));
        assert!(report.hardening.is_none());
        assert!(report.syslog.is_none());
        assert_eq!(report.reached, RunState::AuditedRunning);
        assert_eq!(
            session.commands(),
            vec!["show running-config", "show startup-config"]
        );
        assert_eq!(session.calls().last(), Some(&Call::Disconnect));
    }

    #[test]
    fn test_audit_only_run() {
        let mut session = device();
        let mut recorder = Recorder::default();
        let report = run(&mut session, &plan(false), &mut recorder);

        assert!(!recorder.confirm_asked);
        assert!(report.audit.is_some());
        assert!(report.hardening_confirmed.is_none());
        assert_eq!(session.commands().len(), 2);
        assert_eq!(report.state, RunState::Disconnected);
    }

    #[test]
    fn test_fetch_failure_skips_diff_only() {
        let mut session = device().failing_command("show startup-config");
        let mut recorder = Recorder::default();
        let report = run(&mut session, &plan(true), &mut recorder);

        assert!(!report.is_fatal());
        assert!(report.diff.is_none());
        assert!(report.audit.is_some());
        assert_eq!(recorder.errors, vec![Step::FetchStartup, Step::Diff]);
        assert!(report.hardening.is_some());
    }

    #[test]
    fn test_running_fetch_failure_skips_audit() {
        let mut session = device().failing_command("show running-config");
        let report = run(&mut session, &plan(false), &mut AutoConfirm);

        let steps: Vec<Step> = report.step_errors.iter().map(|e| e.step).collect();
        assert_eq!(steps, vec![Step::FetchRunning, Step::Diff, Step::Audit]);
        assert!(report.audit.is_none());
        assert_eq!(report.reached, RunState::AuditedRunning);
    }

    #[test]
    fn test_snapshot_write_failure_is_not_fatal() {
        let temp = TempDir::new().unwrap();
        let blocker = temp.path().join("not-a-dir");
        std::fs::write(&blocker, "").unwrap();

        let mut run_plan = plan(false);
        run_plan.snapshots = Some(SnapshotPaths::new(&blocker, "r.txt", "s.txt"));

        let mut session = device();
        let report = run(&mut session, &run_plan, &mut AutoConfirm);

        let steps: Vec<Step> = report.step_errors.iter().map(|e| e.step).collect();
        assert_eq!(steps, vec![Step::SaveRunning, Step::SaveStartup]);
        assert!(report.running_snapshot.is_none());
        assert_eq!(report.diff_summary.map(|s| s.added), Some(1));
    }

    #[test]
    fn test_reconnects_when_session_dropped() {
        let mut session = device().drop_after_commands(2);
        let report = run(&mut session, &plan(true), &mut AutoConfirm);

        assert!(report.is_clean(), "{:?}", report.step_errors);
        assert_eq!(session.connect_count(), 2);
        assert_eq!(report.reached, RunState::SyslogConfigured);
    }

    #[test]
    fn test_timed_out_fetch_does_not_leak_into_next_step() {
        let temp = TempDir::new().unwrap();
        let mut run_plan = plan(true);
        run_plan.snapshots = Some(SnapshotPaths::new(temp.path(), "running.txt", "startup.txt"));

        let mut session = device().timing_out_command("show running-config");
        let report = run(&mut session, &run_plan, &mut AutoConfirm);

        assert!(!report.is_fatal());
        let steps: Vec<Step> = report.step_errors.iter().map(|e| e.step).collect();
        assert_eq!(steps, vec![Step::FetchRunning, Step::Diff, Step::Audit]);
        assert!(report.step_errors[0].message.contains("timed out"));

        assert!(!temp.path().join("running.txt").exists());
        assert_eq!(
            std::fs::read_to_string(temp.path().join("startup.txt")).unwrap(),
            startup()
        );
        assert_eq!(session.connect_count(), 2);

        let hardening = report.hardening.as_ref().unwrap();
        assert!(hardening.is_success());
        assert_eq!(report.reached, RunState::SyslogConfigured);
        assert_eq!(
            session.commands()[..3],
            ["show running-config", "show startup-config", "configure terminal"]
        );
    }

    #[test]
    fn test_session_closed_on_panic() {
        struct Panics;
        impl ApplyObserver for Panics {
            fn on_command_start(&mut self, _command: &str) {}
            fn on_command_complete(&mut self, _outcome: &CommandOutcome) {}
        }
        impl RunObserver for Panics {
            fn confirm_hardening(&mut self, _commands: &[String]) -> anyhow::Result<bool> {
                panic!("observer blew up");
            }
        }

        let mut session = device();
        let result = catch_unwind(AssertUnwindSafe(|| {
            run(&mut session, &plan(true), &mut Panics)
        }));

        assert!(result.is_err());
        assert_eq!(session.calls().last(), Some(&Call::Disconnect));
        assert!(!session.is_connected());
    }

    #[test]
    fn test_report_json() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("report.json");

        let mut session = device().refuse_enable();
        let report = run(&mut session, &plan(true), &mut AutoConfirm);
        report.write_json(&path).unwrap();

        let value: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(value["state"], "failed");
        assert_eq!(value["fatal"]["step"], "privileged");
        assert_eq!(value["host"], "r1");
        assert!(value["fatal"]["advice"].is_string());
    }
}
