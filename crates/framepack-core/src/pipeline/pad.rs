//! Padding transform: places every image on the shared canvas.
//!
//! Sources are composited at the origin, so padding always grows to the
//! right and bottom. Alpha sources get a transparent black canvas, opaque
//! sources an RGB black one. Workers stage frames under their catalog
//! position; sequence indices are handed out afterwards, in catalog order,
//! to successful frames only.

use image::{imageops, DynamicImage, ImageFormat, RgbImage, RgbaImage};
use std::path::{Path, PathBuf};

use crate::error::PipelineError;
use crate::types::{
    Canvas, FrameMetadataRecord, ImageEntry, ImageFailure, MetadataTable, ProgressFn,
};

use super::batch::{run_bounded, BatchItem};
use super::decode;

/// Stage name used in reports and progress events.
pub const STAGE: &str = "pad";

/// Lossless file name of the frame at `index`.
pub fn frame_file_name(index: u32) -> String {
    format!("{index:05}.png")
}

impl BatchItem for ImageEntry {
    fn path(&self) -> &Path {
        &self.path
    }
}

/// Pads catalog images onto the canvas using a bounded worker pool.
pub struct FramePadder {
    workers: usize,
    progress: Option<ProgressFn>,
}

/// Padded frames and the metadata describing them.
#[derive(Debug, Default)]
pub struct PadOutcome {
    /// Frame files, position == sequence index
    pub frames: Vec<PathBuf>,
    /// Sequence index to original geometry
    pub table: MetadataTable,
    /// Images that could not be padded
    pub failures: Vec<ImageFailure>,
}

/// A frame staged by a worker, not yet given a sequence index.
#[derive(Debug)]
struct StagedFrame {
    staged: PathBuf,
    record: FrameMetadataRecord,
}

impl FramePadder {
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

    /// Pad every entry into `work_dir` and assign dense sequence indices.
    pub async fn pad_all(
        &self,
        entries: Vec<ImageEntry>,
        canvas: Canvas,
        work_dir: &Path,
    ) -> Result<PadOutcome, PipelineError> {
        let dir = work_dir.to_path_buf();
        let report = run_bounded(
            STAGE,
            entries,
            self.workers,
            self.progress.clone(),
            move |entry: ImageEntry| pad_one(&entry, canvas, &dir),
        )
        .await;

        let mut outcome = PadOutcome {
            failures: report.failed,
            ..Default::default()
        };

        // Ordered merge: input order is catalog order, so indices stay dense
        // and deterministic whatever the completion order was.
        for (index, staged) in (0u32..).zip(report.succeeded) {
            let frame = work_dir.join(frame_file_name(index));
            std::fs::rename(&staged.staged, &frame).map_err(|e| PipelineError::WorkDir {
                path: staged.staged.clone(),
                message: format!("Cannot rename staged frame: {e}"),
            })?;
            outcome.table.insert(index, staged.record);
            outcome.frames.push(frame);
        }

        Ok(outcome)
    }
}

/// Decode, composite and stage one image.
fn pad_one(entry: &ImageEntry, canvas: Canvas, work_dir: &Path) -> Result<StagedFrame, PipelineError> {
    let start = std::time::Instant::now();
    let source = decode::decode(&entry.path)?;
    let (width, height) = (source.width(), source.height());
    if width > canvas.width || height > canvas.height {
        return Err(PipelineError::Pad {
            path: entry.path.clone(),
            message: format!("{width}x{height} does not fit canvas {canvas}"),
        });
    }

    let has_alpha = source.color().has_alpha();
    let padded = composite(&source, canvas);

    let staged = work_dir.join(format!("pending-{:06}.png", entry.catalog_index));
    padded
        .save_with_format(&staged, ImageFormat::Png)
        .map_err(|e| PipelineError::Pad {
            path: entry.path.clone(),
            message: e.to_string(),
        })?;

    tracing::trace!("Padded {:?} in {:?}", entry.path, start.elapsed());
    Ok(StagedFrame {
        staged,
        record: FrameMetadataRecord {
            filename: entry.file_name.clone(),
            width,
            height,
            has_alpha,
        },
    })
}

/// Place `source` at the canvas origin over a black background.
///
/// Over a fully transparent canvas, pasting with the source's own alpha as
/// the mask reduces to a straight copy; copying also keeps the colour of
/// fully transparent source pixels.
pub fn composite(source: &DynamicImage, canvas: Canvas) -> DynamicImage {
    if source.color().has_alpha() {
        let mut frame = RgbaImage::new(canvas.width, canvas.height);
        imageops::replace(&mut frame, &source.to_rgba8(), 0, 0);
        DynamicImage::ImageRgba8(frame)
    } else {
        let mut frame = RgbImage::new(canvas.width, canvas.height);
        imageops::replace(&mut frame, &source.to_rgb8(), 0, 0);
        DynamicImage::ImageRgb8(frame)
    }
}
