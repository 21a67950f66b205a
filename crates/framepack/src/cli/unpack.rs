//! The `framepack unpack` command.

use clap::Args;
use framepack_core::{Config, Unpacker};
use std::path::PathBuf;

use super::progress::{print_failures, print_summary, Row, StageProgress};

/// Arguments for the `unpack` command.
#[derive(Args, Debug)]
pub struct UnpackArgs {
    /// Container produced by `framepack pack`
    #[arg(required = true)]
    pub container: PathBuf,

    /// Directory to restore images into (created if missing)
    #[arg(required = true)]
    pub output_dir: PathBuf,

    /// Number of parallel workers [config default: 4]
    #[arg(short, long)]
    pub parallel: Option<usize>,

    /// Keep the decoded frames after restoring
    #[arg(long)]
    pub keep_work_dir: bool,
}

impl UnpackArgs {
    /// Apply command-line overrides on top of `config`.
    pub fn apply(&self, config: &mut Config) {
        if let Some(workers) = self.parallel {
            config.processing.parallel_workers = workers;
        }
        if self.keep_work_dir {
            config.general.keep_work_dir = true;
        }
    }
}

/// Execute the unpack command.
pub async fn execute(args: UnpackArgs) -> anyhow::Result<()> {
    if !args.container.is_file() {
        anyhow::bail!("Container does not exist: {:?}", args.container);
    }

    let mut config = Config::load()?;
    args.apply(&mut config);
    config.validate()?;

    let progress = StageProgress::new();
    let result = Unpacker::new(config)
        .with_progress(Some(progress.callback()))
        .unpack(&args.container, &args.output_dir)
        .await;
    progress.clear();
    let report = result?;

    print_summary(
        "Unpack Summary",
        &[
            Row::Count("Expected", report.expected),
            Row::Count("Decoded", report.decoded),
            Row::Count("Restored", report.restored),
            Row::Count("Missing", report.missing.len()),
            Row::Count("Extra frames", report.excess),
            Row::Count("Failed", report.failures.len()),
            Row::Rule,
            Row::Text("Output", report.output_dir.display().to_string()),
        ],
        report.elapsed,
    );
    if !report.missing.is_empty() {
        tracing::warn!("No frame decoded for indices {:?}", report.missing);
    }
    print_failures("Failed restorations", &report.failures);
    Ok(())
}
