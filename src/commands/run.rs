//! Device commands: `run` and `audit`.

use anyhow::{Context as _, Result};
use devicekit::{Session, SshSession};
use std::path::Path;

use crate::Context;
use crate::cli::{AuditArgs, ConnectionArgs, RunArgs};
use crate::engine::report::print_summary;
use crate::engine::{self, ConsoleObserver, RunPlan, RunReport};
use crate::schema::NethardenConfig;
use crate::ui;

pub fn run(ctx: &Context, args: RunArgs) -> Result<()> {
    let config = load_config(ctx, &args.connection)?;
    let report = execute(ctx, &config, !args.dry_run, args.yes)?;

    if args.dry_run && !report.is_fatal() {
        show_dry_run(&config);
    }
    finish(&report, args.report.as_deref())
}

pub fn audit(ctx: &Context, args: AuditArgs) -> Result<()> {
    let config = load_config(ctx, &args.connection)?;
    let report = execute(ctx, &config, false, false)?;
    finish(&report, args.report.as_deref())
}

fn load_config(ctx: &Context, connection: &ConnectionArgs) -> Result<NethardenConfig> {
    let (mut config, path) = NethardenConfig::load(ctx.config.as_deref())?;
    log::debug!("Config file: {}", path.display());

    config.apply_overrides(&connection.overrides());
    config
        .validate()
        .with_context(|| format!("Invalid configuration (from {})", path.display()))?;
    Ok(config)
}

/// Build the run plan from a validated config.
fn plan(config: &NethardenConfig, harden: bool) -> RunPlan {
    RunPlan {
        rules: config.rules(),
        commands: config.commands(),
        save_command: config.save_command().map(String::from),
        syslog_server: config.syslog_server().map(String::from),
        snapshots: Some(config.snapshot_paths()),
        harden,
    }
}

fn execute(ctx: &Context, config: &NethardenConfig, harden: bool, yes: bool) -> Result<RunReport> {
    let target = config.target()?;
    let plan = plan(config, harden);

    ui::header(&format!("netharden {}", target.address()));
    if ctx.verbose > 0 {
        ui::kv("Device", &target.device_type().to_string());
        ui::kv("User", target.username());
        ui::kv("Timeout", &format!("{}s", config.timeout().as_secs()));
    }

    let mut session = SshSession::new(target).with_timeout(config.timeout());
    let mut observer = ConsoleObserver::new(session.host(), yes, ctx.quiet);
    Ok(engine::run(&mut session, &plan, &mut observer))
}

fn show_dry_run(config: &NethardenConfig) {
    ui::section("Dry run, would apply:");
    for (i, command) in config.commands().iter().enumerate() {
        ui::item(i + 1, &hardening::redact_command(command));
    }
    if let Some(save) = config.save_command() {
        ui::kv("then", save);
    }
    if let Some(server) = config.syslog_server() {
        ui::kv("syslog", &hardening::syslog_command(server));
    }
}

fn finish(report: &RunReport, report_path: Option<&Path>) -> Result<()> {
    print_summary(report);

    if let Some(path) = report_path {
        report.write_json(path)?;
        ui::dim(&format!("Report written to {}", path.display()));
    }

    println!();
    if let Some(fatal) = &report.fatal {
        anyhow::bail!("Run against {} failed: {fatal}", report.host);
    }
    if report.is_clean() {
        ui::success("Done");
    } else {
        ui::warn(&format!(
            "Finished with {} step error(s)",
            report.step_errors.len()
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> NethardenConfig {
        let mut config = NethardenConfig::sample();
        config.device.enable_password = "s3cret".to_string();
        config
    }

    #[test]
    fn test_plan_from_config() {
        let plan = plan(&config(), true);
        assert!(plan.harden);
        assert_eq!(plan.rules.len(), 7);
        assert!(plan.commands.contains(&"enable secret s3cret".to_string()));
        assert_eq!(plan.save_command.as_deref(), Some("write memory"));
        assert_eq!(plan.syslog_server.as_deref(), Some("192.168.1.100"));
        assert_eq!(
            plan.snapshots.map(|p| p.running),
            Some(std::path::PathBuf::from("./running_config.txt"))
        );
    }

    #[test]
    fn test_plan_without_syslog() {
        let mut config = config();
        config.syslog.server = None;
        let plan = plan(&config, false);
        assert!(!plan.harden);
        assert!(plan.syslog_server.is_none());
    }
}
