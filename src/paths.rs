//! Path resolution for netharden
//!
//! # Environment Variables
//!
//! - `NETHARDEN_CONFIG_DIR` - Override config directory (e.g., `~/dotfiles/netharden`)
//!
//! # Path Resolution Priority
//!
//! For config_dir():
//! 1. `NETHARDEN_CONFIG_DIR` environment variable
//! 2. `XDG_CONFIG_HOME/netharden` (if set)
//! 3. Platform default:
//!    - Windows: `%APPDATA%\netharden`
//!    - macOS/Linux: `~/.config/netharden`

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};

/// Environment variable for config directory override
pub const ENV_CONFIG_DIR: &str = "NETHARDEN_CONFIG_DIR";

/// Config file name inside the config directory
pub const CONFIG_FILE: &str = "config.toml";

/// Get the netharden config directory path
pub fn config_dir() -> Result<PathBuf> {
    if let Ok(dir) = std::env::var(ENV_CONFIG_DIR) {
        let path = expand(&dir);
        log::debug!(
            "Using config dir from {}: {}",
            ENV_CONFIG_DIR,
            path.display()
        );
        return Ok(path);
    }

    if let Ok(xdg_config) = std::env::var("XDG_CONFIG_HOME") {
        let path = PathBuf::from(xdg_config).join("netharden");
        log::debug!("Using XDG_CONFIG_HOME: {}", path.display());
        return Ok(path);
    }

    #[cfg(windows)]
    {
        if let Some(app_data) = dirs::config_dir() {
            let path = app_data.join("netharden");
            log::debug!("Using Windows config dir: {}", path.display());
            return Ok(path);
        }
    }

    let home = dirs::home_dir().context("Could not determine home directory")?;
    let path = home.join(".config").join("netharden");
    log::debug!("Using default config dir: {}", path.display());
    Ok(path)
}

/// Resolve the config file: an explicit `--config` path wins, otherwise
/// `config.toml` in [`config_dir`].
pub fn config_file(explicit: Option<&Path>) -> Result<PathBuf> {
    match explicit {
        Some(path) => Ok(expand(&path.to_string_lossy())),
        None => Ok(config_dir()?.join(CONFIG_FILE)),
    }
}

/// Expand ~ and environment variables in a path string.
pub fn expand(path: &str) -> PathBuf {
    let expanded = shellexpand::full(path).unwrap_or(std::borrow::Cow::Borrowed(path));
    PathBuf::from(expanded.as_ref())
}

// ============================================================================
// Tests
// ============================================================================
