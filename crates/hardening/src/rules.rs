//! Built-in rule table and hardening command list for Cisco IOS.

use crate::audit::HardeningRule;
use crate::error::{Error, Result};

/// Persists the running configuration to NVRAM.
pub const DEFAULT_SAVE_COMMAND: &str = "write memory";

/// VTY section header; the enable secret goes right before it.
const VTY_SECTION: &str = "line vty";

/// Commands whose argument is a secret.
const SECRET_COMMANDS: &[&str] = &["enable secret ", "enable password "];

/// Replacement shown for a secret argument.
const REDACTED: &str = "********";

/// Default audit rules, in display order.
///
/// "Enable secret password set" only checks that some `enable secret` is
/// configured, not which one, so the secret never has to live in the rule
/// table. A device with a different secret still passes.
pub fn default_rules() -> Vec<HardeningRule> {
    [
        ("SSH enabled", "ip ssh version 2"),
        ("Telnet disabled", "no service telnet"),
        ("Password encryption", "service password-encryption"),
        ("Logging enabled", "logging buffered"),
        ("NTP configured", "ntp server"),
        ("Enable secret password set", "enable secret"),
        ("VTY lines secured", "transport input ssh"),
    ]
    .into_iter()
    .map(|(name, must_contain)| HardeningRule::new(name, must_contain))
    .collect()
}

/// Default hardening commands, in the order they must be applied.
///
/// `login local` and `transport input ssh` only make sense inside the
/// `line vty 0 4` sub-mode entered just before them.
pub fn default_commands() -> Vec<String> {
    [
        "service password-encryption",
        "no ip http server",
        "no ip http secure-server",
        "ip ssh version 2",
        "no service telnet",
        "logging buffered",
        "logging trap informational",
        "ntp server 192.168.1.100",
        "banner motd # Unauthorized access is prohibited! #",
        "line vty 0 4",
        "login local",
        "transport input ssh",
    ]
    .into_iter()
    .map(String::from)
    .collect()
}

/// Insert `enable secret <secret>` before the VTY section (or at the end
/// when there is none). A blank secret leaves the list unchanged.
pub fn with_enable_secret(mut commands: Vec<String>, secret: &str) -> Vec<String> {
    if secret.is_empty() {
        return commands;
    }
    let command = format!("enable secret {secret}");
    let at = commands
        .iter()
        .position(|c| c.starts_with(VTY_SECTION))
        .unwrap_or(commands.len());
    commands.insert(at, command);
    commands
}

/// Command that sends logs to a remote syslog server.
pub fn syslog_command(server: &str) -> String {
    format!("logging {}", server.trim())
}

/// The command as it may be logged or reported, with any secret masked.
pub fn redact_command(command: &str) -> String {
    SECRET_COMMANDS
        .iter()
        .find(|prefix| {
            command
                .strip_prefix(**prefix)
                .is_some_and(|rest| !rest.trim().is_empty())
        })
        .map_or_else(|| command.to_string(), |prefix| format!("{prefix}{REDACTED}"))
}

/// Reject blank commands.
pub fn validate_commands(commands: &[String]) -> Result<()> {
    match commands.iter().position(|c| c.trim().is_empty()) {
        Some(i) => Err(Error::EmptyCommand { index: i + 1 }),
        None => Ok(()),
    }
}
