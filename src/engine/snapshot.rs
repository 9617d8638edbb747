//! Configuration snapshot files.
//!
//! Each run overwrites one file per configuration kind in the output
//! directory. The same files can be fed back to `check` and `diff`.

use anyhow::{Context, Result};
use hardening::{ConfigKind, ConfigText};
use std::fs;
use std::path::{Path, PathBuf};

/// Where the running and startup snapshots are written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SnapshotPaths {
    pub running: PathBuf,
    pub startup: PathBuf,
}

impl SnapshotPaths {
    pub fn new(dir: &Path, running_file: &str, startup_file: &str) -> Self {
        Self {
            running: dir.join(running_file),
            startup: dir.join(startup_file),
        }
    }

    /// Path for one configuration kind.
    pub fn path(&self, kind: ConfigKind) -> &Path {
        match kind {
            ConfigKind::Running => &self.running,
            ConfigKind::Startup => &self.startup,
        }
    }
}

/// Write a snapshot, creating the parent directory and replacing any
/// previous file.
pub fn write(path: &Path, config: &ConfigText) -> Result<()> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        fs::create_dir_all(parent)
            .with_context(|| format!("Could not create directory: {}", parent.display()))?;
    }
    fs::write(path, config.as_str())
        .with_context(|| format!("Could not write snapshot: {}", path.display()))?;
    log::debug!("Wrote {} lines to {}", config.line_count(), path.display());
    Ok(())
}

/// Read a saved configuration file.
pub fn read(path: &Path) -> Result<ConfigText> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("Could not read config file: {}", path.display()))?;
    Ok(ConfigText::new(content))
}
