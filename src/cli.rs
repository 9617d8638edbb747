use clap::{Args, Parser, Subcommand};
use clap_complete::Shell;
use std::path::PathBuf;

use crate::schema::Overrides;

#[derive(Parser)]
#[command(name = "netharden")]
#[command(version)]
#[command(about = "Audit and harden network device configurations over SSH", long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Verbosity level
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress non-essential output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Config file (default: $NETHARDEN_CONFIG_DIR/config.toml or ~/.config/netharden/config.toml)
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Snapshot, diff, audit, then apply hardening and syslog
    Run(RunArgs),

    /// Snapshot, diff and audit without changing the device
    Audit(AuditArgs),

    /// Audit a saved configuration file
    Check(CheckArgs),

    /// Diff two saved configuration files
    Diff(DiffArgs),

    /// Show the audit rules and hardening commands
    Rules,

    /// Manage the configuration file
    #[command(subcommand)]
    Config(ConfigCommand),

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

// ============================================================================
// Device Commands
// ============================================================================

/// Connection settings that override the config file
#[derive(Args, Debug, Default)]
pub struct ConnectionArgs {
    /// Device hostname or IP address
    #[arg(long, env = "NETHARDEN_HOST")]
    pub host: Option<String>,

    /// SSH port
    #[arg(long)]
    pub port: Option<u16>,

    /// Login user
    #[arg(long, env = "NETHARDEN_USERNAME")]
    pub username: Option<String>,

    /// Login password
    #[arg(long, env = "NETHARDEN_PASSWORD", hide_env_values = true)]
    pub password: Option<String>,

    /// Enable secret
    #[arg(long, env = "NETHARDEN_ENABLE_PASSWORD", hide_env_values = true)]
    pub enable_password: Option<String>,

    /// Remote syslog server
    #[arg(long, env = "NETHARDEN_SYSLOG_SERVER")]
    pub syslog_server: Option<String>,

    /// Directory for snapshot files
    #[arg(long, value_name = "DIR")]
    pub output_dir: Option<PathBuf>,

    /// Timeout for each remote call, in seconds
    #[arg(long, value_name = "SECS")]
    pub timeout: Option<u64>,
}

impl ConnectionArgs {
    pub fn overrides(&self) -> Overrides {
        Overrides {
            host: self.host.clone(),
            port: self.port,
            username: self.username.clone(),
            password: self.password.clone(),
            enable_password: self.enable_password.clone(),
            timeout_secs: self.timeout,
            syslog_server: self.syslog_server.clone(),
            output_dir: self.output_dir.clone(),
        }
    }
}

#[derive(Parser)]
pub struct RunArgs {
    #[command(flatten)]
    pub connection: ConnectionArgs,

    /// Show what would be applied without changing the device
    #[arg(short = 'n', long)]
    pub dry_run: bool,

    /// Apply without asking for confirmation
    #[arg(short, long)]
    pub yes: bool,

    /// Write a JSON report of the run
    #[arg(long, value_name = "PATH")]
    pub report: Option<PathBuf>,
}

#[derive(Parser)]
pub struct AuditArgs {
    #[command(flatten)]
    pub connection: ConnectionArgs,

    /// Write a JSON report of the run
    #[arg(long, value_name = "PATH")]
    pub report: Option<PathBuf>,
}

// ============================================================================
// Offline Commands
// ============================================================================

#[derive(Parser)]
pub struct CheckArgs {
    /// Saved running configuration
    pub file: PathBuf,

    /// Exit with an error if any rule fails
    #[arg(long)]
    pub strict: bool,
}

#[derive(Parser)]
pub struct DiffArgs {
    /// First configuration (lines only here are removed)
    pub from: PathBuf,

    /// Second configuration (lines only here are added)
    pub to: PathBuf,

    /// Lines of context around each change
    #[arg(short = 'U', long, default_value_t = hardening::DEFAULT_CONTEXT)]
    pub context: usize,
}

// ============================================================================
// Config Commands
// ============================================================================

#[derive(Subcommand)]
pub enum ConfigCommand {
    /// Show the effective configuration (secrets redacted)
    Show,

    /// Write a sample config file
    Init {
        /// Overwrite an existing file
        #[arg(short, long)]
        force: bool,
    },
}
