//! # devicekit
//!
//! Remote shell sessions for network devices.
//!
//! This crate provides:
//! - The [`Session`] trait: connect, enter privileged mode, send commands,
//!   disconnect
//! - [`SshSession`], an interactive SSH implementation for Cisco IOS
//! - [`MockSession`], a scripted implementation for tests
//! - Typed errors that separate connection, privilege, command and timeout
//!   failures
//!
//! ## Example
//!
//! ```no_run
//! use devicekit::{DeviceTarget, Session, SshSession};
//! use std::time::Duration;
//!
//! let target = DeviceTarget::new("192.168.56.101", "admin", "password", "enable-secret");
//! let mut session = SshSession::new(target).with_timeout(Duration::from_secs(20));
//!
//! session.connect().expect("connect failed");
//! session.enter_privileged().expect("enable failed");
//! let running = session.send_command("show running-config").expect("show failed");
//! println!("{running}");
//! session.disconnect();
//! ```

#![warn(clippy::all)]

pub mod backend;
pub mod error;
pub mod prompt;
pub mod types;

pub use backend::mock::{Call, MockSession};
pub use backend::ssh::SshSession;
pub use backend::{CONFIGURE_TERMINAL, END_CONFIG, Session};
pub use error::{Error, ErrorCategory, Result};
pub use types::{DEFAULT_PORT, DEFAULT_TIMEOUT, DeviceTarget, DeviceType, Secret};
