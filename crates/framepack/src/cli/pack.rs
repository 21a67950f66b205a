//! The `framepack pack` command.

use clap::Args;
use framepack_core::{Config, EncoderProfile, Packer};
use std::path::PathBuf;

use super::progress::{print_failures, print_summary, Row, StageProgress};

/// Arguments for the `pack` command.
///
/// Unset options fall back to the config file.
#[derive(Args, Debug, Default)]
pub struct PackArgs {
    /// Directory of images to pack
    #[arg(required = true)]
    pub input: PathBuf,

    /// Constant rate factor for x264/nvenc [config default: 17]
    #[arg(long)]
    pub crf: Option<u32>,

    /// Quantization parameter for x264/nvenc [config default: 15]
    #[arg(long)]
    pub qp: Option<u32>,

    /// Encoder preset [config default: slow]
    #[arg(long)]
    pub preset: Option<String>,

    /// Encode on the GPU with h264_nvenc
    #[arg(long, conflicts_with = "lossless")]
    pub nvenc: bool,

    /// Encode with FFV1 (bit-exact, keeps alpha)
    #[arg(long)]
    pub lossless: bool,

    /// Frames per second of the container [config default: 1]
    #[arg(long)]
    pub frame_rate: Option<u32>,

    /// Container path [config default: output.mkv]
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Number of parallel workers [config default: 4]
    #[arg(short, long)]
    pub parallel: Option<usize>,

    /// Keep the padded frames and manifest after encoding
    #[arg(long)]
    pub keep_work_dir: bool,
}

impl PackArgs {
    /// Apply command-line overrides on top of `config`.
    pub fn apply(&self, config: &mut Config) {
        if let Some(crf) = self.crf {
            config.encoder.crf = crf;
        }
        if let Some(qp) = self.qp {
            config.encoder.qp = qp;
        }
        if let Some(preset) = &self.preset {
            config.encoder.preset = preset.clone();
        }
        if self.nvenc {
            config.encoder.profile = EncoderProfile::Hardware;
        }
        if self.lossless {
            config.encoder.profile = EncoderProfile::Ffv1;
        }
        if let Some(rate) = self.frame_rate {
            config.encoder.frame_rate = rate;
        }
        if let Some(output) = &self.output {
            config.encoder.output = output.clone();
        }
        if let Some(workers) = self.parallel {
            config.processing.parallel_workers = workers;
        }
        if self.keep_work_dir {
            config.general.keep_work_dir = true;
        }
    }
}

/// Execute the pack command.
pub async fn execute(args: PackArgs) -> anyhow::Result<()> {
    if !args.input.is_dir() {
        anyhow::bail!(
            "Input directory does not exist: {:?}\n\n  Hint: pack takes a directory of images.",
            args.input
        );
    }

    let mut config = Config::load()?;
    args.apply(&mut config);
    config.validate()?;
    tracing::info!(
        "Packing {:?} with profile {} into {:?}",
        args.input,
        config.encoder.profile,
        config.output_path()
    );

    let progress = StageProgress::new();
    let result = Packer::new(config)
        .with_progress(Some(progress.callback()))
        .pack(&args.input)
        .await;
    progress.clear();
    let report = result?;

    print_summary(
        "Pack Summary",
        &[
            Row::Count("Scanned", report.scanned),
            Row::Count("Packed", report.frames),
            Row::Count("Failed", report.failures.len()),
            Row::Rule,
            Row::Text("Canvas", report.canvas.to_string()),
            Row::Text("Container", report.container.display().to_string()),
        ],
        report.elapsed,
    );
    print_failures("Skipped images", &report.failures);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[derive(Parser)]
    struct TestCli {
        #[command(flatten)]
        args: PackArgs,
    }

    fn parse(argv: &[&str]) -> PackArgs {
        TestCli::parse_from(std::iter::once("pack").chain(argv.iter().copied())).args
    }

    #[test]
    fn test_no_flags_keep_config_values() {
        let mut config = Config::default();
        parse(&["./images"]).apply(&mut config);

        assert_eq!(config.encoder.crf, 17);
        assert_eq!(config.encoder.qp, 15);
        assert_eq!(config.encoder.preset, "slow");
        assert_eq!(config.encoder.profile, EncoderProfile::Software);
        assert!(!config.general.keep_work_dir);
    }

    #[test]
    fn test_flags_override_config() {
        let mut config = Config::default();
        parse(&[
            "./images", "--crf", "0", "--qp", "0", "--preset", "veryslow", "--nvenc",
            "--frame-rate", "5", "-o", "set.mkv", "-p", "8", "--keep-work-dir",
        ])
        .apply(&mut config);

        assert_eq!(config.encoder.crf, 0);
        assert_eq!(config.encoder.qp, 0);
        assert_eq!(config.encoder.preset, "veryslow");
        assert_eq!(config.encoder.profile, EncoderProfile::Hardware);
        assert_eq!(config.encoder.frame_rate, 5);
        assert_eq!(config.encoder.output, PathBuf::from("set.mkv"));
        assert_eq!(config.processing.parallel_workers, 8);
        assert!(config.general.keep_work_dir);
    }

    #[test]
    fn test_lossless_selects_ffv1() {
        let mut config = Config::default();
        parse(&["./images", "--lossless"]).apply(&mut config);
        assert_eq!(config.encoder.profile, EncoderProfile::Ffv1);
    }

    #[test]
    fn test_nvenc_conflicts_with_lossless() {
        let result = TestCli::try_parse_from(["pack", "./images", "--nvenc", "--lossless"]);
        assert!(result.is_err());
    }
}
