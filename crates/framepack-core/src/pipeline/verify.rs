//! Round-trip verification: compares originals with their restored copies.
//!
//! Files are matched by name. Two images match when their dimensions, colour
//! type and BLAKE3 digest of the native pixel buffer are all equal, so a copy
//! that lost bit depth or channels is a mismatch.

use image::{ColorType, DynamicImage};
use std::path::{Path, PathBuf};
use std::time::Instant;

use crate::config::{LimitsConfig, ProcessingConfig};
use crate::error::PipelineError;
use crate::types::{ImageEntry, ImageFailure, ProgressFn, VerifyReport};

use super::batch::run_bounded;
use super::decode;
use super::discovery::FileDiscovery;

/// Stage name used in reports and progress events.
pub const STAGE: &str = "verify";

/// Geometry and content fingerprint of one decoded image.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PixelDigest {
    pub width: u32,
    pub height: u32,
    pub color: ColorType,
    pub digest: blake3::Hash,
}

impl PixelDigest {
    pub fn of(image: &DynamicImage) -> Self {
        Self {
            width: image.width(),
            height: image.height(),
            color: image.color(),
            digest: blake3::hash(image.as_bytes()),
        }
    }

    /// First difference between `self` (original) and `other` (restored).
    pub fn difference(&self, other: &Self) -> Option<String> {
        if (self.width, self.height) != (other.width, other.height) {
            Some(format!(
                "size {}x{} restored as {}x{}",
                self.width, self.height, other.width, other.height
            ))
        } else if self.color != other.color {
            Some(format!("color {:?} restored as {:?}", self.color, other.color))
        } else if self.digest != other.digest {
            Some("pixel data differs".to_string())
        } else {
            None
        }
    }
}

/// Compares an original directory with a restored one.
pub struct Verifier {
    discovery: FileDiscovery,
    workers: usize,
    progress: Option<ProgressFn>,
}

/// Verdict for one file that could be read on both sides.
enum Verdict {
    Match,
    Mismatch(PathBuf, String),
}

impl Verifier {
    pub fn new(processing: ProcessingConfig, limits: LimitsConfig) -> Self {
        let workers = processing.parallel_workers;
        Self {
            discovery: FileDiscovery::new(processing, limits),
            workers,
            progress: None,
        }
    }

    pub fn with_progress(mut self, progress: Option<ProgressFn>) -> Self {
        self.progress = progress;
        self
    }

    /// Compare every supported image in `original_dir` with the file of the
    /// same name in `restored_dir`.
    pub async fn verify(
        &self,
        original_dir: &Path,
        restored_dir: &Path,
    ) -> Result<VerifyReport, PipelineError> {
        let start = Instant::now();
        if !restored_dir.is_dir() {
            return Err(PipelineError::DirectoryUnreadable {
                path: restored_dir.to_path_buf(),
                message: "not a directory".to_string(),
            });
        }

        let scan = self.discovery.scan(original_dir)?;
        let mut report = VerifyReport {
            failures: scan.skipped,
            ..Default::default()
        };

        let (present, missing): (Vec<ImageEntry>, Vec<ImageEntry>) = scan
            .entries
            .into_iter()
            .partition(|entry| restored_dir.join(&entry.file_name).is_file());
        for entry in missing {
            tracing::warn!("No restored file for {}", entry.file_name);
            report.missing.push(entry.file_name);
        }

        report.compared = present.len();
        let restored = restored_dir.to_path_buf();
        let batch = run_bounded(STAGE, present, self.workers, self.progress.clone(), move |entry| {
            compare(&entry.path, &restored.join(&entry.file_name))
        })
        .await;

        for verdict in batch.succeeded {
            match verdict {
                Verdict::Match => report.matched += 1,
                Verdict::Mismatch(path, reason) => {
                    tracing::warn!("Mismatch for {:?}: {}", path, reason);
                    report.mismatches.push(ImageFailure::new(path, STAGE, reason));
                }
            }
        }
        report.failures.extend(batch.failed);
        report.elapsed = start.elapsed();

        tracing::info!(
            "Verified {} files: {} matched, {} mismatched, {} missing",
            report.compared,
            report.matched,
            report.mismatches.len(),
            report.missing.len()
        );
        Ok(report)
    }
}

fn compare(original: &Path, restored: &Path) -> Result<Verdict, PipelineError> {
    let expected = PixelDigest::of(&decode::decode(original)?);
    let actual = PixelDigest::of(&decode::decode(restored)?);
    Ok(match expected.difference(&actual) {
        None => Verdict::Match,
        Some(reason) => Verdict::Mismatch(original.to_path_buf(), reason),
    })
}
