//! SSH backend for Cisco IOS class devices using `ssh2`.
//!
//! IOS does not run commands through `exec` channels reliably, so this
//! backend opens a PTY shell and drives it like a terminal: write a line,
//! read until a prompt comes back.

use crate::backend::Session;
use crate::error::{Error, Result};
use crate::prompt::{Prompt, clean_reply, find_prompt};
use crate::types::{DEFAULT_TIMEOUT, DeviceTarget};
use std::io::{ErrorKind, Read, Write};
use std::net::{TcpStream, ToSocketAddrs};
use std::time::{Duration, Instant};

/// Disables `--More--` paging for the rest of the session.
const TERMINAL_LENGTH_ZERO: &str = "terminal length 0";

/// Terminal width requested for the PTY; wide enough that IOS does not
/// wrap configuration lines.
const PTY_WIDTH: u32 = 511;

/// Interactive SSH session to one device.
pub struct SshSession {
    target: DeviceTarget,
    timeout: Duration,
    conn: Option<Connection>,
}

/// Live libssh2 state. The TCP stream is owned by `session`.
struct Connection {
    session: ssh2::Session,
    channel: ssh2::Channel,
    prompt: Prompt,
}

impl SshSession {
    /// Create a session for `target`. Nothing is opened until `connect`.
    pub fn new(target: DeviceTarget) -> Self {
        Self {
            target,
            timeout: DEFAULT_TIMEOUT,
            conn: None,
        }
    }

    /// Bound every remote call by `timeout`.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    fn connection_error(&self, message: impl Into<String>) -> Error {
        Error::Connection {
            host: self.target.host().to_string(),
            message: message.into(),
        }
    }

    fn open(&self) -> Result<Connection> {
        let address = self.target.address();
        let socket = address
            .to_socket_addrs()
            .map_err(|e| self.connection_error(format!("cannot resolve {address}: {e}")))?
            .next()
            .ok_or_else(|| self.connection_error(format!("no address for {address}")))?;

        log::debug!("Opening TCP connection to {socket}");
        let tcp = TcpStream::connect_timeout(&socket, self.timeout)
            .map_err(|e| self.connection_error(format!("TCP connect to {address} failed: {e}")))?;

        let mut session = ssh2::Session::new()
            .map_err(|e| self.connection_error(format!("SSH session init failed: {e}")))?;
        session.set_tcp_stream(tcp);
        session.set_timeout(timeout_millis(self.timeout));
        session
            .handshake()
            .map_err(|e| self.connection_error(format!("SSH handshake failed: {e}")))?;

        session
            .userauth_password(self.target.username(), self.target.password().expose())
            .map_err(|e| self.connection_error(format!("SSH authentication failed: {e}")))?;
        if !session.authenticated() {
            return Err(self.connection_error("SSH authentication failed"));
        }

        let mut channel = session
            .channel_session()
            .map_err(|e| self.connection_error(format!("SSH channel open failed: {e}")))?;
        channel
            .request_pty("vt100", None, Some((PTY_WIDTH, 24, 0, 0)))
            .map_err(|e| self.connection_error(format!("PTY request failed: {e}")))?;
        channel
            .shell()
            .map_err(|e| self.connection_error(format!("shell request failed: {e}")))?;

        let mut conn = Connection {
            session,
            channel,
            prompt: Prompt::UserExec(String::new()),
        };
        let (_, prompt) = conn
            .read_until_prompt(self.timeout, "login prompt")
            .map_err(|e| match e {
                Error::Connection { message, .. } => self.connection_error(message),
                other => other,
            })?;
        conn.prompt = prompt;
        Ok(conn)
    }

    fn conn_mut(&mut self) -> Result<&mut Connection> {
        self.conn.as_mut().ok_or(Error::NotConnected)
    }

    /// Run `f` against the live connection, dropping it if the session
    /// turned out to be dead or a reply is still in flight after a timeout.
    fn with_conn<T>(&mut self, f: impl FnOnce(&mut Connection, Duration) -> Result<T>) -> Result<T> {
        let timeout = self.timeout;
        let host = self.target.host().to_string();
        let result = f(self.conn_mut()?, timeout).map_err(|e| match e {
            Error::Connection { message, .. } => Error::Connection { host, message },
            other => other,
        });
        if let Err(e) = &result
            && e.is_session_lost()
        {
            log::warn!("Discarding session to {}: {e}", self.target.host());
            self.conn = None;
        }
        result
    }
}

impl Connection {
    fn write_line(&mut self, line: &str) -> Result<()> {
        self.channel.write_all(line.as_bytes())?;
        self.channel.write_all(b"\n")?;
        self.channel.flush()?;
        Ok(())
    }

    /// Read until a prompt ends the buffer or the deadline passes.
    fn read_until_prompt(&mut self, timeout: Duration, waiting_for: &str) -> Result<(String, Prompt)> {
        let deadline = Instant::now() + timeout;
        let mut buffer = String::new();
        let mut chunk = [0u8; 4096];

        loop {
            match self.channel.read(&mut chunk) {
                Ok(0) => {
                    if self.channel.eof() {
                        return Err(Error::Connection {
                            host: String::new(),
                            message: "remote side closed the session".to_string(),
                        });
                    }
                }
                Ok(n) => {
                    buffer.push_str(&String::from_utf8_lossy(&chunk[..n]));
                    log::trace!("<< {:?}", String::from_utf8_lossy(&chunk[..n]));
                    if let Some(prompt) = find_prompt(&buffer) {
                        return Ok((buffer, prompt));
                    }
                }
                // libssh2 reports its own timeout as a generic error
                Err(e)
                    if matches!(e.kind(), ErrorKind::TimedOut | ErrorKind::WouldBlock)
                        || Instant::now() >= deadline => {}
                Err(e) => return Err(Error::Io(e)),
            }

            if Instant::now() >= deadline {
                return Err(Error::Timeout {
                    waiting_for: waiting_for.to_string(),
                    secs: timeout.as_secs(),
                });
            }
        }
    }

    fn exec(&mut self, command: &str, timeout: Duration) -> Result<String> {
        log::trace!(">> {command}");
        self.write_line(command)?;
        let (raw, prompt) = self.read_until_prompt(timeout, &format!("reply to '{command}'"))?;
        self.prompt = prompt;

        let output = clean_reply(&raw, command);
        match Error::from_device_output(command, &output) {
            Some(err) => Err(err),
            None => Ok(output),
        }
    }

    fn enable(&mut self, secret: &str, timeout: Duration) -> Result<()> {
        if self.prompt.is_privileged() {
            return Ok(());
        }

        self.write_line("enable")?;
        let (_, mut prompt) = self.read_until_prompt(timeout, "enable password prompt")?;
        if prompt == Prompt::Password {
            self.write_line(secret)?;
            let (raw, next) = self.read_until_prompt(timeout, "privileged prompt")?;
            if let Some(Error::Command { message, .. }) = Error::from_device_output("enable", &raw) {
                return Err(Error::Auth { message });
            }
            prompt = next;
        }

        match prompt {
            Prompt::Privileged(_) => {
                self.prompt = prompt;
                Ok(())
            }
            Prompt::Password => Err(Error::Auth {
                message: "enable password rejected".to_string(),
            }),
            Prompt::UserExec(p) => Err(Error::Auth {
                message: format!("still at user prompt '{p}'"),
            }),
        }
    }

    fn close(mut self) {
        let _ = self.write_line("exit");
        if let Err(e) = self.channel.send_eof() {
            log::debug!("send_eof failed: {e}");
        }
        if let Err(e) = self.channel.close() {
            log::debug!("channel close failed: {e}");
        }
        if let Err(e) = self.session.disconnect(None, "netharden done", None) {
            log::debug!("SSH disconnect failed: {e}");
        }
    }
}

impl Session for SshSession {
    fn host(&self) -> &str {
        self.target.host()
    }

    fn is_connected(&self) -> bool {
        self.conn.as_ref().is_some_and(|c| !c.channel.eof())
    }

    fn connect(&mut self) -> Result<()> {
        if self.is_connected() {
            return Ok(());
        }

        log::info!(
            "Connecting to {} ({}) as {}",
            self.target.address(),
            self.target.device_type(),
            self.target.username()
        );
        let mut conn = self.open()?;
        if let Err(e) = conn.exec(TERMINAL_LENGTH_ZERO, self.timeout) {
            log::warn!("Could not disable paging: {e}");
        }
        self.conn = Some(conn);
        Ok(())
    }

    fn enter_privileged(&mut self) -> Result<()> {
        let secret = self.target.enable_password().clone();
        self.with_conn(|conn, timeout| conn.enable(secret.expose(), timeout))?;
        log::debug!("Privileged mode on {}", self.target.host());
        Ok(())
    }

    fn send_command(&mut self, command: &str) -> Result<String> {
        self.with_conn(|conn, timeout| conn.exec(command, timeout))
    }

    fn disconnect(&mut self) {
        if let Some(conn) = self.conn.take() {
            log::info!("Disconnecting from {}", self.target.host());
            conn.close();
        }
    }
}

impl Drop for SshSession {
    fn drop(&mut self) {
        self.disconnect();
    }
}

fn timeout_millis(timeout: Duration) -> u32 {
    u32::try_from(timeout.as_millis()).unwrap_or(u32::MAX)
}
