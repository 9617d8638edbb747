use anyhow::{Context as _, Result};
use std::path::Path;

use crate::Context;
use crate::cli::ConfigCommand;
use crate::paths;
use crate::schema::NethardenConfig;
use crate::ui;

pub fn run(ctx: &Context, cmd: ConfigCommand) -> Result<()> {
    match cmd {
        ConfigCommand::Show => show(ctx),
        ConfigCommand::Init { force } => {
            let path = paths::config_file(ctx.config.as_deref())?;
            init(&path, force)?;
            ui::success(&format!("Created {}", path.display()));
            ui::dim("Set NETHARDEN_PASSWORD and NETHARDEN_ENABLE_PASSWORD rather than storing secrets in the file.");
            Ok(())
        }
    }
}

fn show(ctx: &Context) -> Result<()> {
    let (config, path) = NethardenConfig::load(ctx.config.as_deref())?;

    ui::header("Configuration");
    ui::kv("Config file", &path.display().to_string());
    if !path.exists() {
        ui::dim("Not found, showing defaults (run 'netharden config init')");
    }
    println!();

    let text = toml::to_string_pretty(&config.redacted()).context("Failed to serialize config")?;
    println!("{text}");

    if let Err(e) = config.validate() {
        ui::warn(&format!("{e:#}"));
    }
    Ok(())
}

/// Write the sample config to `path`; refuses to overwrite unless `force`.
fn init(path: &Path, force: bool) -> Result<()> {
    if path.exists() && !force {
        anyhow::bail!(
            "{} already exists (use --force to overwrite)",
            path.display()
        );
    }
    NethardenConfig::sample().save_to(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_init_writes_loadable_sample() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("netharden").join("config.toml");

        init(&path, false).unwrap();
        let config = NethardenConfig::load_from(&path).unwrap();
        assert_eq!(config, NethardenConfig::sample());
    }

    #[test]
    fn test_init_refuses_overwrite() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("config.toml");
        std::fs::write(&path, "# mine\n").unwrap();

        assert!(init(&path, false).is_err());
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "# mine\n");

        init(&path, true).unwrap();
        assert!(std::fs::read_to_string(&path).unwrap().contains("[device]"));
    }
}
