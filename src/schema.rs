use anyhow::{Context, Result};
use devicekit::{DEFAULT_PORT, DeviceTarget, DeviceType};
use hardening::{DEFAULT_SAVE_COMMAND, HardeningRule};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::engine::snapshot::SnapshotPaths;
use crate::paths;

/// Shown instead of a secret by `config show`.
const REDACTED: &str = "********";

// ============================================================================
// Main Config Schema
// ============================================================================

/// The netharden configuration file
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NethardenConfig {
    /// Device to connect to
    #[serde(default)]
    pub device: DeviceConfig,

    /// Remote syslog destination
    #[serde(default)]
    pub syslog: SyslogConfig,

    /// Snapshot files
    #[serde(default)]
    pub output: OutputConfig,

    /// Rule table and command list
    #[serde(default)]
    pub hardening: HardeningConfig,
}

impl NethardenConfig {
    /// Load the config from the resolved config file path.
    ///
    /// Returns the config and the path it was (or would have been) read from.
    pub fn load(explicit: Option<&Path>) -> Result<(Self, PathBuf)> {
        let path = paths::config_file(explicit)?;
        let config = Self::load_from(&path)?;
        Ok((config, path))
    }

    /// Load from a specific file. A missing file yields the defaults.
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            log::debug!("No config file at {}, using defaults", path.display());
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Could not read config file: {}", path.display()))?;

        toml::from_str(&content)
            .with_context(|| format!("Invalid TOML format in {}", path.display()))
    }

    /// Save the config to `path`, creating the parent directory.
    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Could not create directory: {}", parent.display()))?;
        }
        let content = toml::to_string_pretty(self).context("Failed to serialize config")?;
        std::fs::write(path, content)
            .with_context(|| format!("Could not write config file: {}", path.display()))?;
        Ok(())
    }

    /// Layer command-line / environment values over the file.
    pub fn apply_overrides(&mut self, overrides: &Overrides) {
        let device = &mut self.device;
        if let Some(host) = &overrides.host {
            device.host.clone_from(host);
        }
        if let Some(port) = overrides.port {
            device.port = port;
        }
        if let Some(username) = &overrides.username {
            device.username.clone_from(username);
        }
        if let Some(password) = &overrides.password {
            device.password.clone_from(password);
        }
        if let Some(enable_password) = &overrides.enable_password {
            device.enable_password.clone_from(enable_password);
        }
        if let Some(timeout) = overrides.timeout_secs {
            device.timeout_secs = timeout;
        }
        if let Some(server) = &overrides.syslog_server {
            self.syslog.server = Some(server.clone());
        }
        if let Some(dir) = &overrides.output_dir {
            self.output.dir = dir.display().to_string();
        }
    }

    /// Validate everything a device run needs.
    pub fn validate(&self) -> Result<()> {
        self.device.validate()?;
        self.output.validate()?;
        self.validate_hardening()
    }

    /// Validate only the rule table and command list (offline commands).
    pub fn validate_hardening(&self) -> Result<()> {
        hardening::validate_rules(&self.rules()).context("Invalid [hardening] rules")?;
        hardening::validate_commands(&self.commands()).context("Invalid [hardening] commands")?;
        Ok(())
    }

    /// Build the connection target.
    pub fn target(&self) -> Result<DeviceTarget> {
        let device_type: DeviceType = self
            .device
            .device_type
            .parse()
            .context("Invalid [device] device_type")?;
        Ok(DeviceTarget::new(
            self.device.host.trim(),
            self.device.username.as_str(),
            self.device.password.as_str(),
            self.device.enable_password.as_str(),
        )
        .with_port(self.device.port)
        .with_device_type(device_type))
    }

    /// Per-call timeout.
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.device.timeout_secs)
    }

    /// Audit rules: the configured table, or the built-in one.
    pub fn rules(&self) -> Vec<HardeningRule> {
        self.hardening
            .rules
            .clone()
            .unwrap_or_else(hardening::default_rules)
    }

    /// Hardening commands, with the enable secret derived from
    /// `enable_password`.
    pub fn commands(&self) -> Vec<String> {
        let commands = self
            .hardening
            .commands
            .clone()
            .unwrap_or_else(hardening::default_commands);
        hardening::with_enable_secret(commands, &self.device.enable_password)
    }

    /// Persist command, if any.
    pub fn save_command(&self) -> Option<&str> {
        non_blank(&self.hardening.save_command)
    }

    /// Syslog server, if any.
    pub fn syslog_server(&self) -> Option<&str> {
        self.syslog.server.as_deref().and_then(non_blank)
    }

    /// Snapshot file locations.
    pub fn snapshot_paths(&self) -> SnapshotPaths {
        SnapshotPaths::new(
            &paths::expand(&self.output.dir),
            &self.output.running_file,
            &self.output.startup_file,
        )
    }

    /// Copy with every secret replaced, for display.
    pub fn redacted(&self) -> Self {
        let mut config = self.clone();
        for secret in [
            &mut config.device.password,
            &mut config.device.enable_password,
        ] {
            if !secret.is_empty() {
                *secret = REDACTED.to_string();
            }
        }
        config
    }

    /// Starting point written by `config init`.
    pub fn sample() -> Self {
        Self {
            device: DeviceConfig {
                host: "192.168.56.101".to_string(),
                username: "admin".to_string(),
                ..Default::default()
            },
            syslog: SyslogConfig {
                server: Some("192.168.1.100".to_string()),
            },
            ..Default::default()
        }
    }
}

fn non_blank(value: &str) -> Option<&str> {
    let trimmed = value.trim();
    (!trimmed.is_empty()).then_some(trimmed)
}

/// Values given on the command line or through the environment.
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub host: Option<String>,
    pub port: Option<u16>,
    pub username: Option<String>,
    pub password: Option<String>,
    pub enable_password: Option<String>,
    pub timeout_secs: Option<u64>,
    pub syslog_server: Option<String>,
    pub output_dir: Option<PathBuf>,
}

// ============================================================================
// Device
// ============================================================================

/// `[device]` section
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceConfig {
    /// Hostname or IP address
    #[serde(default)]
    pub host: String,

    /// SSH port
    #[serde(default = "default_port")]
    pub port: u16,

    /// Login user
    #[serde(default)]
    pub username: String,

    /// Login password (prefer NETHARDEN_PASSWORD)
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub password: String,

    /// Enable secret (prefer NETHARDEN_ENABLE_PASSWORD)
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub enable_password: String,

    /// Device platform; only `cisco_ios` is supported
    #[serde(default = "default_device_type")]
    pub device_type: String,

    /// Timeout for each remote call, in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for DeviceConfig {
    fn default() -> Self {
        Self {
            host: String::new(),
            port: default_port(),
            username: String::new(),
            password: String::new(),
            enable_password: String::new(),
            device_type: default_device_type(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl DeviceConfig {
    pub fn validate(&self) -> Result<()> {
        if self.host.trim().is_empty() {
            anyhow::bail!("Device host cannot be empty (set [device] host or --host)");
        }
        if self.username.trim().is_empty() {
            anyhow::bail!("Device username cannot be empty (set [device] username or --username)");
        }
        if self.port == 0 {
            anyhow::bail!("Device port cannot be 0");
        }
        if self.timeout_secs == 0 {
            anyhow::bail!("Device timeout_secs must be greater than 0");
        }
        self.device_type
            .parse::<DeviceType>()
            .context("Invalid [device] device_type")?;
        Ok(())
    }
}

fn default_port() -> u16 {
    DEFAULT_PORT
}

fn default_device_type() -> String {
    DeviceType::CiscoIos.as_str().to_string()
}

fn default_timeout_secs() -> u64 {
    devicekit::DEFAULT_TIMEOUT.as_secs()
}

// ============================================================================
// Syslog
// ============================================================================

/// `[syslog]` section
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyslogConfig {
    /// Remote syslog server; syslog is not configured when unset
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub server: Option<String>,
}

// ============================================================================
// Output
// ============================================================================

/// `[output]` section
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutputConfig {
    /// Directory for snapshot files
    #[serde(default = "default_output_dir")]
    pub dir: String,

    #[serde(default = "default_running_file")]
    pub running_file: String,

    #[serde(default = "default_startup_file")]
    pub startup_file: String,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            dir: default_output_dir(),
            running_file: default_running_file(),
            startup_file: default_startup_file(),
        }
    }
}

impl OutputConfig {
    pub fn validate(&self) -> Result<()> {
        if self.running_file.trim().is_empty() || self.startup_file.trim().is_empty() {
            anyhow::bail!("Snapshot file names cannot be empty");
        }
        if self.running_file == self.startup_file {
            anyhow::bail!(
                "running_file and startup_file must differ (both are '{}')",
                self.running_file
            );
        }
        Ok(())
    }
}

fn default_output_dir() -> String {
    ".".to_string()
}

fn default_running_file() -> String {
    "running_config.txt".to_string()
}

fn default_startup_file() -> String {
    "startup_config.txt".to_string()
}

// ============================================================================
// Hardening
// ============================================================================

/// `[hardening]` section
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HardeningConfig {
    /// Replaces the built-in command list when set
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub commands: Option<Vec<String>>,

    /// Issued once after the commands; empty disables saving
    #[serde(default = "default_save_command")]
    pub save_command: String,

    /// Replaces the built-in rule table when set
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rules: Option<Vec<HardeningRule>>,
}

impl Default for HardeningConfig {
    fn default() -> Self {
        Self {
            commands: None,
            save_command: default_save_command(),
            rules: None,
        }
    }
}

fn default_save_command() -> String {
    DEFAULT_SAVE_COMMAND.to_string()
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn valid() -> NethardenConfig {
        let mut config = NethardenConfig::sample();
        config.device.password = "password".to_string();
        config.device.enable_password = "enable123".to_string();
        config
    }

    #[test]
    fn test_parse_example_config() {
        let toml = r#"
[device]
host = "10.0.0.1"
port = 2222
username = "netops"
timeout_secs = 10

[syslog]
server = "10.0.0.50"

[output]
dir = "/var/lib/netharden"

[hardening]
commands = ["ip ssh version 2", "no service telnet"]
save_command = "copy running-config startup-config"

[[hardening.rules]]
name = "SSH enabled"
must_contain = "ip ssh version 2"
"#;

        let config: NethardenConfig = toml::from_str(toml).unwrap();
        assert_eq!(config.device.host, "10.0.0.1");
        assert_eq!(config.device.port, 2222);
        assert_eq!(config.device.device_type, "cisco_ios");
        assert_eq!(config.timeout(), Duration::from_secs(10));
        assert_eq!(config.syslog_server(), Some("10.0.0.50"));
        assert_eq!(config.output.running_file, "running_config.txt");
        assert_eq!(config.rules().len(), 1);
        assert_eq!(
            config.commands(),
            vec!["ip ssh version 2", "no service telnet"]
        );
        assert_eq!(
            config.save_command(),
            Some("copy running-config startup-config")
        );
    }

    #[test]
    fn test_defaults() {
        let config: NethardenConfig = toml::from_str("").unwrap();
        assert_eq!(config, NethardenConfig::default());
        assert_eq!(config.device.port, 22);
        assert_eq!(config.device.timeout_secs, 30);
        assert_eq!(config.save_command(), Some("write memory"));
        assert_eq!(config.syslog_server(), None);
        assert_eq!(config.rules(), hardening::default_rules());
        assert_eq!(config.commands(), hardening::default_commands());
    }

    #[test]
    fn test_missing_file_is_default() {
        let temp = TempDir::new().unwrap();
        let config = NethardenConfig::load_from(&temp.path().join("config.toml")).unwrap();
        assert_eq!(config, NethardenConfig::default());
    }

    #[test]
    fn test_invalid_toml_is_error() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("config.toml");
        std::fs::write(&path, "[device\nhost = 1").unwrap();
        let err = NethardenConfig::load_from(&path).unwrap_err();
        assert!(err.to_string().contains("Invalid TOML"));
    }

    #[test]
    fn test_save_and_load() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("sub").join("config.toml");
        let config = NethardenConfig::sample();
        config.save_to(&path).unwrap();
        assert_eq!(NethardenConfig::load_from(&path).unwrap(), config);
    }

    #[test]
    fn test_overrides_take_precedence() {
        let mut config = valid();
        config.apply_overrides(&Overrides {
            host: Some("10.9.9.9".to_string()),
            port: Some(2200),
            enable_password: Some("from-env".to_string()),
            syslog_server: Some("10.0.0.7".to_string()),
            output_dir: Some(PathBuf::from("/tmp/snaps")),
            ..Default::default()
        });

        assert_eq!(config.device.host, "10.9.9.9");
        assert_eq!(config.device.port, 2200);
        assert_eq!(config.device.username, "admin");
        assert_eq!(config.device.password, "password");
        assert_eq!(config.syslog_server(), Some("10.0.0.7"));
        assert_eq!(
            config.snapshot_paths().running,
            PathBuf::from("/tmp/snaps/running_config.txt")
        );
        assert!(config.commands().contains(&"enable secret from-env".to_string()));
    }

    #[test]
    fn test_validation() {
        assert!(valid().validate().is_ok());

        let mut config = valid();
        config.device.host = "  ".to_string();
        assert!(config.validate().is_err());

        let mut config = valid();
        config.device.username = String::new();
        assert!(config.validate().is_err());

        let mut config = valid();
        config.device.timeout_secs = 0;
        assert!(config.validate().is_err());

        let mut config = valid();
        config.device.device_type = "juniper_junos".to_string();
        assert!(config.validate().is_err());
        assert!(config.target().is_err());

        let mut config = valid();
        config.output.startup_file = config.output.running_file.clone();
        assert!(config.validate().is_err());

        let mut config = valid();
        config.hardening.rules = Some(vec![HardeningRule::new("empty", "")]);
        assert!(config.validate().is_err());

        let mut config = valid();
        config.hardening.commands = Some(vec![String::new()]);
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_target() {
        let target = valid().target().unwrap();
        assert_eq!(target.host(), "192.168.56.101");
        assert_eq!(target.username(), "admin");
        assert_eq!(target.enable_password().expose(), "enable123");
        assert_eq!(target.device_type(), DeviceType::CiscoIos);
    }

    #[test]
    fn test_redacted() {
        let config = valid().redacted();
        assert_eq!(config.device.password, REDACTED);
        assert_eq!(config.device.enable_password, REDACTED);

        let text = toml::to_string_pretty(&config).unwrap();
        assert!(!text.contains("enable123"));

        // Nothing to hide stays empty
        assert!(NethardenConfig::default().redacted().device.password.is_empty());
    }

    #[test]
    fn test_blank_syslog_and_save_disable() {
        let mut config = valid();
        config.syslog.server = Some("  ".to_string());
        config.hardening.save_command = String::new();
        assert_eq!(config.syslog_server(), None);
        assert_eq!(config.save_command(), None);
    }
}
