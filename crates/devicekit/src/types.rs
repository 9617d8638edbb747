//! Core types for device sessions.

use crate::error::Error;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

/// Default SSH port.
pub const DEFAULT_PORT: u16 = 22;

/// Default per-call timeout.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// A credential that never shows up in `Debug` output or logs.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct Secret(String);

impl Secret {
    /// Wrap a credential.
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// Get the credential as a string slice.
    ///
    /// Use only at the point where the device needs it.
    pub fn expose(&self) -> &str {
        &self.0
    }

    /// Check if the credential is empty.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Debug for Secret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Secret(***)")
    }
}

impl From<String> for Secret {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl From<&str> for Secret {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

/// Device platform, selects prompt and command conventions.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeviceType {
    /// Cisco IOS / IOS-XE
    #[default]
    CiscoIos,
}

impl DeviceType {
    /// Identifier used in configuration files.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::CiscoIos => "cisco_ios",
        }
    }
}

impl fmt::Display for DeviceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DeviceType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "cisco_ios" | "ios" | "cisco_xe" => Ok(Self::CiscoIos),
            other => Err(Error::UnsupportedDevice(other.to_string())),
        }
    }
}

/// Everything needed to reach and log into one device.
///
/// Built once at startup and never modified.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceTarget {
    host: String,
    port: u16,
    username: String,
    password: Secret,
    enable_password: Secret,
    device_type: DeviceType,
}

impl DeviceTarget {
    /// Create a target on the default port.
    pub fn new(
        host: impl Into<String>,
        username: impl Into<String>,
        password: impl Into<Secret>,
        enable_password: impl Into<Secret>,
    ) -> Self {
        Self {
            host: host.into(),
            port: DEFAULT_PORT,
            username: username.into(),
            password: password.into(),
            enable_password: enable_password.into(),
            device_type: DeviceType::default(),
        }
    }

    /// Use a non-default SSH port.
    pub fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    /// Set the device platform.
    pub fn with_device_type(mut self, device_type: DeviceType) -> Self {
        self.device_type = device_type;
        self
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    pub fn username(&self) -> &str {
        &self.username
    }

    pub fn password(&self) -> &Secret {
        &self.password
    }

    pub fn enable_password(&self) -> &Secret {
        &self.enable_password
    }

    pub fn device_type(&self) -> DeviceType {
        self.device_type
    }

    /// `host:port` for display and socket resolution.
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
