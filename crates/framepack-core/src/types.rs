//! Core data types for the framepack pipeline.
//!
//! These types describe source images, the shared frame canvas, the
//! per-frame metadata carried through the container, and the reports each
//! stage returns.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

/// One source image in the catalog.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageEntry {
    /// Location of the source file
    pub path: PathBuf,

    /// Base name used to restore identity on unpack
    pub file_name: String,

    /// Width in pixels at scan time
    pub width: u32,

    /// Height in pixels at scan time
    pub height: u32,

    /// Whether the source pixel format carries an alpha channel
    pub has_alpha: bool,

    /// Position in sorted catalog order
    pub catalog_index: usize,
}

/// The single frame size shared by every packed image.
///
/// Both dimensions are even and cover every surviving image.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Canvas {
    pub width: u32,
    pub height: u32,
}

impl Canvas {
    /// Smallest even canvas covering `max_width` x `max_height`.
    ///
    /// Odd maxima round up, never down, so the covering invariant holds.
    /// A zero maximum still yields a 2-pixel dimension.
    pub fn covering(max_width: u32, max_height: u32) -> Self {
        Self {
            width: round_even(max_width),
            height: round_even(max_height),
        }
    }
}

impl std::fmt::Display for Canvas {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

fn round_even(value: u32) -> u32 {
    value.saturating_add(value & 1).max(2)
}

/// Per-frame metadata needed to undo padding.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FrameMetadataRecord {
    /// Original base name
    pub filename: String,

    /// Original (pre-padding) width
    pub width: u32,

    /// Original (pre-padding) height
    pub height: u32,

    /// Whether the original had an alpha channel
    #[serde(default)]
    pub has_alpha: bool,
}

/// Sequence index to metadata record, keys dense from zero.
pub type MetadataTable = BTreeMap<u32, FrameMetadataRecord>;

/// A single image that failed somewhere in a batch stage.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImageFailure {
    /// File the failure refers to
    pub path: PathBuf,

    /// Stage name ("scan", "bounds", "pad", "restore", ...)
    pub stage: String,

    /// Human-readable reason
    pub message: String,
}

impl ImageFailure {
    pub fn new(path: impl Into<PathBuf>, stage: &str, message: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            stage: stage.to_string(),
            message: message.into(),
        }
    }
}

/// Progress notification for a per-image stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProgressEvent {
    /// Stage name
    pub stage: &'static str,
    /// Items finished so far (success or failure)
    pub completed: usize,
    /// Items in this stage
    pub total: usize,
}

/// Callback receiving progress events from worker pools.
pub type ProgressFn = Arc<dyn Fn(ProgressEvent) + Send + Sync>;

/// Outcome of a complete pack run.
#[derive(Debug, Clone)]
pub struct PackReport {
    /// Written container
    pub container: PathBuf,

    /// Frame size used for every frame
    pub canvas: Canvas,

    /// Frames encoded
    pub frames: usize,

    /// Candidate files found in the source directory
    pub scanned: usize,

    /// Images dropped along the way
    pub failures: Vec<ImageFailure>,

    /// Wall-clock time of the run
    pub elapsed: Duration,
}

/// Outcome of a complete unpack run.
#[derive(Debug, Clone)]
pub struct UnpackReport {
    /// Directory holding the restored files
    pub output_dir: PathBuf,

    /// Records in the metadata artifact
    pub expected: usize,

    /// Frame files the codec produced
    pub decoded: usize,

    /// Files restored under their original names
    pub restored: usize,

    /// Indices with no decoded frame
    pub missing: Vec<u32>,

    /// Decoded frames beyond the metadata count
    pub excess: usize,

    /// Per-image restoration failures
    pub failures: Vec<ImageFailure>,

    /// Wall-clock time of the run
    pub elapsed: Duration,
}

/// Outcome of comparing an original directory with a restored one.
#[derive(Debug, Clone, Default)]
pub struct VerifyReport {
    /// Originals that were compared
    pub compared: usize,

    /// Files identical in geometry, alpha and pixels
    pub matched: usize,

    /// Files that differ, with the first difference found
    pub mismatches: Vec<ImageFailure>,

    /// Originals with no restored counterpart
    pub missing: Vec<String>,

    /// Files that could not be read on either side
    pub failures: Vec<ImageFailure>,

    /// Wall-clock time of the run
    pub elapsed: Duration,
}

impl VerifyReport {
    /// True when every original was found and matched.
    pub fn is_clean(&self) -> bool {
        self.mismatches.is_empty() && self.missing.is_empty() && self.failures.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_canvas_keeps_even_dimensions() {
        let canvas = Canvas::covering(100, 50);
        assert_eq!(canvas, Canvas { width: 100, height: 50 });
    }

    #[test]
    fn test_canvas_rounds_odd_dimensions_up() {
        let canvas = Canvas::covering(101, 63);
        assert_eq!(canvas, Canvas { width: 102, height: 64 });
    }

    #[test]
    fn test_canvas_never_zero() {
        assert_eq!(Canvas::covering(0, 1), Canvas { width: 2, height: 2 });
    }

    #[test]
    fn test_canvas_display() {
        assert_eq!(Canvas::covering(640, 480).to_string(), "640x480");
    }

    #[test]
    fn test_record_missing_alpha_defaults_false() {
        let record: FrameMetadataRecord =
            serde_json::from_str(r#"{"filename":"a.png","width":3,"height":4}"#).unwrap();
        assert!(!record.has_alpha);
    }
}
