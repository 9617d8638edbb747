//! Scripted session for tests and offline runs.
//!
//! Replies come from a command → output table; any command can be made to
//! fail or time out, as can connecting and entering privileged mode. Every call is
//! recorded so tests can assert on what reached the "device".

use crate::backend::Session;
use crate::error::{Error, Result};
use std::collections::{HashMap, HashSet};

/// One recorded interaction with the mock.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    Connect,
    EnterPrivileged,
    Command(String),
    Disconnect,
}

/// Mock device session.
#[derive(Debug, Default)]
pub struct MockSession {
    host: String,
    connected: bool,
    privileged: bool,
    responses: HashMap<String, String>,
    failing: HashSet<String>,
    timing_out: HashSet<String>,
    refuse_connect: bool,
    refuse_enable: bool,
    drop_after: Option<usize>,
    calls: Vec<Call>,
}

impl MockSession {
    /// Create a mock that accepts everything and answers with empty output.
    pub fn new(host: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            ..Default::default()
        }
    }

    /// Answer `command` with `output`.
    pub fn with_response(mut self, command: impl Into<String>, output: impl Into<String>) -> Self {
        self.responses.insert(command.into(), output.into());
        self
    }

    /// Reject `command` with an IOS-style error.
    pub fn failing_command(mut self, command: impl Into<String>) -> Self {
        self.failing.insert(command.into());
        self
    }

    /// Let `command` run past its deadline. Like [`SshSession`], the
    /// session is discarded, so later commands need a reconnect.
    ///
    /// [`SshSession`]: crate::SshSession
    pub fn timing_out_command(mut self, command: impl Into<String>) -> Self {
        self.timing_out.insert(command.into());
        self
    }

    /// Make `connect` fail.
    pub fn refuse_connect(mut self) -> Self {
        self.refuse_connect = true;
        self
    }

    /// Make `enter_privileged` fail.
    pub fn refuse_enable(mut self) -> Self {
        self.refuse_enable = true;
        self
    }

    /// Drop the session after `count` successful commands, the way a device
    /// closes an idle or reloaded VTY line.
    pub fn drop_after_commands(mut self, count: usize) -> Self {
        self.drop_after = Some(count);
        self
    }

    /// Every recorded call, in order.
    pub fn calls(&self) -> &[Call] {
        &self.calls
    }

    /// Commands sent, in order.
    pub fn commands(&self) -> Vec<&str> {
        self.calls
            .iter()
            .filter_map(|c| match c {
                Call::Command(cmd) => Some(cmd.as_str()),
                _ => None,
            })
            .collect()
    }

    /// Number of `connect` calls.
    pub fn connect_count(&self) -> usize {
        self.calls.iter().filter(|c| **c == Call::Connect).count()
    }

    /// Whether privileged mode is active.
    pub fn is_privileged(&self) -> bool {
        self.privileged
    }
}

impl Session for MockSession {
    fn host(&self) -> &str {
        &self.host
    }

    fn is_connected(&self) -> bool {
        self.connected
    }

    fn connect(&mut self) -> Result<()> {
        self.calls.push(Call::Connect);
        if self.refuse_connect {
            return Err(Error::Connection {
                host: self.host.clone(),
                message: "connection refused".to_string(),
            });
        }
        self.connected = true;
        self.privileged = false;
        self.drop_after = self.drop_after.filter(|n| *n > 0);
        Ok(())
    }

    fn enter_privileged(&mut self) -> Result<()> {
        self.calls.push(Call::EnterPrivileged);
        if !self.connected {
            return Err(Error::NotConnected);
        }
        if self.refuse_enable {
            return Err(Error::Auth {
                message: "% Access denied".to_string(),
            });
        }
        self.privileged = true;
        Ok(())
    }

    fn send_command(&mut self, command: &str) -> Result<String> {
        self.calls.push(Call::Command(command.to_string()));
        if !self.connected {
            return Err(Error::NotConnected);
        }
        if self.failing.contains(command) {
            return Err(Error::Command {
                command: command.to_string(),
                message: "Invalid input detected at '^' marker.".to_string(),
            });
        }

        if self.timing_out.contains(command) {
            self.connected = false;
            self.privileged = false;
            return Err(Error::Timeout {
                waiting_for: format!("reply to '{command}'"),
                secs: 30,
            });
        }

        let output = self.responses.get(command).cloned().unwrap_or_default();

        if let Some(remaining) = self.drop_after.as_mut() {
            *remaining -= 1;
            if *remaining == 0 {
                self.drop_after = None;
                self.connected = false;
                self.privileged = false;
            }
        }

        Ok(output)
    }

    fn disconnect(&mut self) {
        self.calls.push(Call::Disconnect);
        self.connected = false;
        self.privileged = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_records_calls_in_order() {
        let mut session = MockSession::new("r1").with_response("show clock", "10:00");
        session.connect().unwrap();
        session.enter_privileged().unwrap();
        assert_eq!(session.send_command("show clock").unwrap(), "10:00");
        assert_eq!(session.send_command("show version").unwrap(), "");
        session.disconnect();

        assert_eq!(
            session.calls(),
            &[
                Call::Connect,
                Call::EnterPrivileged,
                Call::Command("show clock".to_string()),
                Call::Command("show version".to_string()),
                Call::Disconnect,
            ]
        );
        assert_eq!(session.commands(), vec!["show clock", "show version"]);
    }

    #[test]
    fn test_refuse_connect() {
        let mut session = MockSession::new("r1").refuse_connect();
        let err = session.connect().unwrap_err();
        assert!(err.is_session_lost());
        assert!(!session.is_connected());
    }

    #[test]
    fn test_refuse_enable() {
        let mut session = MockSession::new("r1").refuse_enable();
        session.connect().unwrap();
        assert!(matches!(session.enter_privileged(), Err(Error::Auth { .. })));
        assert!(!session.is_privileged());
    }

    #[test]
    fn test_failing_command() {
        let mut session = MockSession::new("r1").failing_command("no service telnet");
        session.connect().unwrap();
        assert!(matches!(
            session.send_command("no service telnet"),
            Err(Error::Command { .. })
        ));
        assert!(session.send_command("ip ssh version 2").is_ok());
    }

    #[test]
    fn test_timeout_discards_session() {
        let mut session = MockSession::new("r1")
            .with_response("show startup-config", "hostname R1")
            .timing_out_command("show running-config");
        session.connect().unwrap();

        let err = session.send_command("show running-config").unwrap_err();
        assert!(matches!(err, Error::Timeout { .. }));
        assert!(err.is_session_lost());
        assert!(!session.is_connected());
        assert!(matches!(
            session.send_command("show startup-config"),
            Err(Error::NotConnected)
        ));

        session.connect().unwrap();
        assert_eq!(session.send_command("show startup-config").unwrap(), "hostname R1");
    }

    #[test]
    fn test_drop_after_commands() {
        let mut session = MockSession::new("r1").drop_after_commands(2);
        session.connect().unwrap();
        session.send_command("a").unwrap();
        assert!(session.is_connected());
        session.send_command("b").unwrap();
        assert!(!session.is_connected());
        assert!(matches!(session.send_command("c"), Err(Error::NotConnected)));

        session.connect().unwrap();
        session.send_command("d").unwrap();
        assert!(session.is_connected());
        assert_eq!(session.connect_count(), 2);
    }

    #[test]
    fn test_config_mode_defaults_use_send_command() {
        let mut session = MockSession::new("r1");
        session.connect().unwrap();
        session.enter_config_mode().unwrap();
        session.exit_config_mode().unwrap();
        assert_eq!(session.commands(), vec!["configure terminal", "end"]);
    }
}
