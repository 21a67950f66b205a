//! Restoration engine: crops decoded frames back to their original geometry.
//!
//! Each frame is cropped to `(0, 0, width, height)` from its record, put back
//! into RGBA or RGB according to the record's alpha flag, and saved under the
//! recorded file name. The output format follows that name's extension.

use image::{DynamicImage, GenericImageView};
use std::path::{Path, PathBuf};

use crate::error::PipelineError;
use crate::types::{FrameMetadataRecord, ImageFailure, ProgressFn};

use super::batch::{run_bounded, BatchItem};
use super::decode;
use super::sequence::FramePair;

/// Stage name used in reports and progress events.
pub const STAGE: &str = "restore";

impl BatchItem for FramePair {
    fn path(&self) -> &Path {
        &self.frame
    }
}

/// Restores paired frames into an output directory.
pub struct FrameRestorer {
    workers: usize,
    progress: Option<ProgressFn>,
}

/// Files written by a restore run.
#[derive(Debug, Default)]
pub struct RestoreOutcome {
    /// Restored files, ascending by sequence index
    pub restored: Vec<PathBuf>,
    /// Frames that could not be restored
    pub failures: Vec<ImageFailure>,
}

impl FrameRestorer {
    pub fn new(workers: usize) -> Self {
        Self {
            workers,
            progress: None,
        }
    }

    pub fn with_progress(mut self, progress: Option<ProgressFn>) -> Self {
        self.progress = progress;
        self
    }

    /// Restore every pair into `output_dir`, creating it if needed.
    ///
    /// Existing files with a recorded name are overwritten. Each decoded
    /// frame is deleted once its image has been written.
    pub async fn restore_all(
        &self,
        pairs: Vec<FramePair>,
        output_dir: &Path,
    ) -> Result<RestoreOutcome, PipelineError> {
        std::fs::create_dir_all(output_dir).map_err(|e| PipelineError::DirectoryUnreadable {
            path: output_dir.to_path_buf(),
            message: format!("Cannot create output directory: {e}"),
        })?;

        let dir = output_dir.to_path_buf();
        let report = run_bounded(STAGE, pairs, self.workers, self.progress.clone(), move |pair| {
            restore_one(&pair, &dir)
        })
        .await;

        Ok(RestoreOutcome {
            restored: report.succeeded,
            failures: report.failed,
        })
    }
}

fn restore_one(pair: &FramePair, output_dir: &Path) -> Result<PathBuf, PipelineError> {
    let name = sanitize_filename(pair.index, &pair.record.filename)?;
    let frame = decode::decode(&pair.frame)?;
    let restored = crop_to_record(&pair.frame, &frame, &pair.record)?;

    let dest = output_dir.join(name);
    restored.save(&dest).map_err(|e| PipelineError::Restore {
        path: dest.clone(),
        message: e.to_string(),
    })?;

    if let Err(e) = std::fs::remove_file(&pair.frame) {
        tracing::warn!("Could not delete decoded frame {:?}: {}", pair.frame, e);
    }

    tracing::trace!("Restored frame {} to {:?}", pair.index, dest);
    Ok(dest)
}

/// Crop `frame`, decoded from `frame_path`, to the recorded size and pixel
/// layout.
pub fn crop_to_record(
    frame_path: &Path,
    frame: &DynamicImage,
    record: &FrameMetadataRecord,
) -> Result<DynamicImage, PipelineError> {
    let invalid = |message: String| PipelineError::Restore {
        path: frame_path.to_path_buf(),
        message,
    };

    let (frame_w, frame_h) = frame.dimensions();
    if record.width == 0 || record.height == 0 {
        return Err(invalid(format!(
            "recorded size {}x{} is empty",
            record.width, record.height
        )));
    }
    if record.width > frame_w || record.height > frame_h {
        return Err(invalid(format!(
            "frame {frame_w}x{frame_h} is smaller than recorded size {}x{}",
            record.width, record.height
        )));
    }

    let cropped = frame.crop_imm(0, 0, record.width, record.height);
    Ok(if record.has_alpha {
        DynamicImage::ImageRgba8(cropped.to_rgba8())
    } else {
        DynamicImage::ImageRgb8(cropped.to_rgb8())
    })
}

/// Reduce a recorded name to a single path component.
///
/// Directory parts are dropped, so a record can never write outside the
/// output directory. Everything else, whitespace included, is kept as
/// recorded.
pub fn sanitize_filename(index: u32, filename: &str) -> Result<String, PipelineError> {
    let base = filename.rsplit(['/', '\\']).next().unwrap_or_default();

    if base.is_empty() || base == "." || base == ".." {
        return Err(PipelineError::InvalidFilename {
            index,
            filename: filename.to_string(),
        });
    }
    if base != filename {
        tracing::warn!("Frame {index}: using {base:?} for recorded name {filename:?}");
    }
    Ok(base.to_string())
}
