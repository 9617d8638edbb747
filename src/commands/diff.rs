//! `diff`: compare two saved configuration files.

use anyhow::Result;

use crate::cli::DiffArgs;
use crate::engine::report::print_diff;
use crate::engine::snapshot;

pub fn run(args: DiffArgs) -> Result<()> {
    let from = snapshot::read(&args.from)?;
    let to = snapshot::read(&args.to)?;

    let from_label = args.from.display().to_string();
    let to_label = args.to.display().to_string();
    print_diff(
        "Differences:",
        &from,
        &to,
        (from_label.as_str(), to_label.as_str()),
        args.context,
    );
    Ok(())
}
