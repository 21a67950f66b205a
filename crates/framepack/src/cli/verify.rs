//! The `framepack verify` command.

use clap::Args;
use framepack_core::{Config, Verifier};
use std::path::PathBuf;

use super::progress::{print_failures, print_summary, Row, StageProgress};

/// Arguments for the `verify` command.
#[derive(Args, Debug)]
pub struct VerifyArgs {
    /// Directory that was packed
    #[arg(required = true)]
    pub original: PathBuf,

    /// Directory that was restored by `framepack unpack`
    #[arg(required = true)]
    pub restored: PathBuf,

    /// Number of parallel workers [config default: 4]
    #[arg(short, long)]
    pub parallel: Option<usize>,
}

/// Execute the verify command.
///
/// Exits non-zero when any file is missing, differs or cannot be read.
pub async fn execute(args: VerifyArgs) -> anyhow::Result<()> {
    let mut config = Config::load()?;
    if let Some(workers) = args.parallel {
        config.processing.parallel_workers = workers;
    }
    config.validate()?;

    let progress = StageProgress::new();
    let result = Verifier::new(config.processing, config.limits)
        .with_progress(Some(progress.callback()))
        .verify(&args.original, &args.restored)
        .await;
    progress.clear();
    let report = result?;

    print_summary(
        "Verify Summary",
        &[
            Row::Count("Compared", report.compared),
            Row::Count("Matched", report.matched),
            Row::Count("Mismatched", report.mismatches.len()),
            Row::Count("Missing", report.missing.len()),
            Row::Count("Unreadable", report.failures.len()),
        ],
        report.elapsed,
    );
    print_failures("Mismatches", &report.mismatches);
    print_failures("Unreadable", &report.failures);
    if !report.missing.is_empty() {
        eprintln!();
        eprintln!("  Missing from {}:", args.restored.display());
        for name in &report.missing {
            eprintln!("    {name}");
        }
    }

    if !report.is_clean() {
        anyhow::bail!("Restored images do not match the originals");
    }
    Ok(())
}
