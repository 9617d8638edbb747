//! `check`: audit a saved configuration file.

use anyhow::Result;
use hardening::{AuditResult, HardeningRule};
use std::path::Path;

use crate::Context;
use crate::cli::CheckArgs;
use crate::engine::report::print_audit;
use crate::engine::snapshot;
use crate::schema::NethardenConfig;
use crate::ui;

pub fn run(ctx: &Context, args: CheckArgs) -> Result<()> {
    let (config, _) = NethardenConfig::load(ctx.config.as_deref())?;
    config.validate_hardening()?;

    ui::header(&format!("Checking {}", args.file.display()));
    let result = check_file(&args.file, &config.rules())?;
    print_audit(&result);

    if ctx.verbose > 0 {
        for failed in result.failures() {
            ui::dim(&format!("{}: missing '{}'", failed.name, failed.must_contain));
        }
    }

    if args.strict && !result.all_passed() {
        anyhow::bail!(
            "{} of {} rules failed",
            result.failed_count(),
            result.len()
        );
    }
    Ok(())
}

fn check_file(path: &Path, rules: &[HardeningRule]) -> Result<AuditResult> {
    let config = snapshot::read(path)?;
    if config.is_empty() {
        ui::warn(&format!("{} is empty", path.display()));
    }
    Ok(hardening::audit(&config, rules))
}
