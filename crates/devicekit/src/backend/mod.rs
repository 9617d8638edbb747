//! Session abstraction for network devices.
//!
//! The [`Session`] trait is the only thing the audit engine knows about a
//! device, allowing for different implementations (SSH, scripted mock).

pub mod mock;
pub mod ssh;

use crate::error::Result;

/// Command that enters global configuration mode.
pub const CONFIGURE_TERMINAL: &str = "configure terminal";

/// Command that leaves configuration mode.
pub const END_CONFIG: &str = "end";

/// An interactive remote-shell session with one device.
///
/// Calls are blocking and bounded by the implementation's timeout. A session
/// is owned exclusively by one caller for its lifetime.
pub trait Session: Send {
    /// Host this session talks to (for messages).
    fn host(&self) -> &str;

    /// Whether the session is currently open.
    fn is_connected(&self) -> bool;

    /// Open the session and log in.
    fn connect(&mut self) -> Result<()>;

    /// Enter privileged exec mode.
    fn enter_privileged(&mut self) -> Result<()>;

    /// Send one command and return its output.
    fn send_command(&mut self, command: &str) -> Result<String>;

    /// Close the session. Never fails; closing a closed session is a no-op.
    fn disconnect(&mut self);

    /// Enter global configuration mode.
    fn enter_config_mode(&mut self) -> Result<()> {
        self.send_command(CONFIGURE_TERMINAL).map(|_| ())
    }

    /// Leave configuration mode.
    fn exit_config_mode(&mut self) -> Result<()> {
        self.send_command(END_CONFIG).map(|_| ())
    }
}

impl<S: Session + ?Sized> Session for Box<S> {
    fn host(&self) -> &str {
        (**self).host()
    }

    fn is_connected(&self) -> bool {
        (**self).is_connected()
    }

    fn connect(&mut self) -> Result<()> {
        (**self).connect()
    }

    fn enter_privileged(&mut self) -> Result<()> {
        (**self).enter_privileged()
    }

    fn send_command(&mut self, command: &str) -> Result<String> {
        (**self).send_command(command)
    }

    fn disconnect(&mut self) {
        (**self).disconnect();
    }

    fn enter_config_mode(&mut self) -> Result<()> {
        (**self).enter_config_mode()
    }

    fn exit_config_mode(&mut self) -> Result<()> {
        (**self).exit_config_mode()
    }
}
