//! `rules`: show the audit rules and hardening commands in effect.

use anyhow::Result;
use colored::Colorize;

use crate::Context;
use crate::schema::NethardenConfig;
use crate::ui;

pub fn run(ctx: &Context) -> Result<()> {
    let (config, path) = NethardenConfig::load(ctx.config.as_deref())?;
    config.validate_hardening()?;

    let source = |custom: bool| {
        if custom {
            path.display().to_string()
        } else {
            "built-in".to_string()
        }
    };

    ui::header("Audit rules");
    ui::dim(&format!("from {}", source(config.hardening.rules.is_some())));
    for (i, rule) in config.rules().iter().enumerate() {
        ui::item(
            i + 1,
            &format!(
                "{} {}",
                rule.name,
                format!("contains '{}'", rule.must_contain).dimmed()
            ),
        );
    }

    ui::header("Hardening commands");
    ui::dim(&format!("from {}", source(config.hardening.commands.is_some())));
    for (i, command) in config.commands().iter().enumerate() {
        ui::item(i + 1, &hardening::redact_command(command));
    }

    println!();
    ui::kv("Save command", config.save_command().unwrap_or("(none)"));
    match config.syslog_server() {
        Some(server) => ui::kv("Syslog", &hardening::syslog_command(server)),
        None => ui::kv("Syslog", "(not configured)"),
    }
    if config.device.enable_password.is_empty() {
        ui::info("No enable password set; 'enable secret' is not in the command list");
    }

    Ok(())
}
