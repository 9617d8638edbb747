//! Error types for device sessions.
//!
//! Errors are categorized so callers can decide which failures abort a run
//! (connection and privilege problems) and which are reported and skipped
//! (a single rejected command). Messages never include credentials.

use thiserror::Error;

/// Categories of session errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// TCP/SSH connection or login failed, or the session dropped
    Connection,
    /// Privileged mode was refused
    Auth,
    /// The device rejected a command
    Command,
    /// No prompt came back before the deadline; the rest of the reply may
    /// still arrive, so the session is out of step with its commands
    Timeout,
    /// Configuration or usage error
    Other,
}

impl ErrorCategory {
    /// Whether a failure of this kind means the session itself is unusable.
    pub fn is_session_lost(&self) -> bool {
        matches!(self, Self::Connection | Self::Timeout)
    }

    /// Get actionable advice for resolving this error category.
    pub fn advice(&self) -> &'static str {
        match self {
            Self::Connection => "Check the host address, SSH service and login credentials",
            Self::Auth => "Check the enable password",
            Self::Command => "Check the command syntax for this device/IOS version",
            Self::Timeout => "Raise timeout_secs or check device load",
            Self::Other => "Check the error details for more information",
        }
    }
}

/// Errors that can occur while talking to a device.
#[derive(Debug, Error)]
pub enum Error {
    /// Could not open or keep the session
    #[error("connection to {host} failed: {message}")]
    Connection {
        /// Device host the session was for
        host: String,
        /// What went wrong
        message: String,
    },

    /// Privileged (enable) mode was refused
    #[error("privileged mode refused: {message}")]
    Auth {
        /// What the device answered
        message: String,
    },

    /// The device rejected a command
    #[error("command '{command}' rejected: {message}")]
    Command {
        /// The command that was sent
        command: String,
        /// Error text reported by the device
        message: String,
    },

    /// No prompt before the deadline
    #[error("timed out after {secs}s waiting for {waiting_for}")]
    Timeout {
        /// What the session was waiting for
        waiting_for: String,
        /// Configured timeout in seconds
        secs: u64,
    },

    /// Operation attempted on a closed session
    #[error("session is not connected")]
    NotConnected,

    /// Device type not supported by this backend
    #[error("unsupported device type: {0}")]
    UnsupportedDevice(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// libssh2 error
    #[error("SSH error: {0}")]
    Ssh(#[from] ssh2::Error),
}

impl Error {
    /// Get the error category.
    pub fn category(&self) -> ErrorCategory {
        match self {
            Error::Connection { .. } | Error::NotConnected | Error::Io(_) | Error::Ssh(_) => {
                ErrorCategory::Connection
            }
            Error::Auth { .. } => ErrorCategory::Auth,
            Error::Command { .. } => ErrorCategory::Command,
            Error::Timeout { .. } => ErrorCategory::Timeout,
            Error::UnsupportedDevice(_) => ErrorCategory::Other,
        }
    }

    /// Whether the session can no longer be used after this error.
    pub fn is_session_lost(&self) -> bool {
        self.category().is_session_lost()
    }

    /// Build a command error from device output, if the output carries an
    /// IOS error marker.
    ///
    /// IOS reports rejected input inline (`% Invalid input detected ...`)
    /// rather than through an exit status, so the reply text is the only
    /// signal.
    pub fn from_device_output(command: &str, output: &str) -> Option<Self> {
        const MARKERS: [&str; 5] = [
            "% Invalid input",
            "% Incomplete command",
            "% Ambiguous command",
            "% Unknown command",
            "% Bad secrets",
        ];

        output
            .lines()
            .map(str::trim)
            .find(|line| MARKERS.iter().any(|marker| line.starts_with(marker)))
            .map(|line| Error::Command {
                command: command.to_string(),
                message: line.trim_start_matches('%').trim().to_string(),
            })
    }
}

/// Result type for session operations.
pub type Result<T> = std::result::Result<T, Error>;
