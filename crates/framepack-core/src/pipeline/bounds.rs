//! Bounding box calculation: the smallest even canvas fitting every image.

use std::path::Path;

use crate::config::LimitsConfig;
use crate::error::PipelineError;
use crate::types::{Canvas, ImageEntry, ImageFailure};

use super::decode;

/// Derives the shared canvas from the catalog.
pub struct BoundingBox {
    limits: LimitsConfig,
}

/// Surviving entries and the canvas that fits all of them.
#[derive(Debug)]
pub struct BoundsOutcome {
    /// The shared canvas
    pub canvas: Canvas,
    /// Entries admitted to the canvas, catalog order preserved
    pub entries: Vec<ImageEntry>,
    /// Entries removed (over the size ceiling or no longer readable)
    pub rejected: Vec<ImageFailure>,
}

impl BoundingBox {
    pub fn new(limits: LimitsConfig) -> Self {
        Self { limits }
    }

    /// Compute the canvas over `entries`.
    ///
    /// Each file's header is re-read so the canvas reflects the actual
    /// pixel dimensions. Images over `max_image_dimension` on either axis
    /// are dropped and never raise the canvas.
    pub fn compute(
        &self,
        source: &Path,
        entries: Vec<ImageEntry>,
    ) -> Result<BoundsOutcome, PipelineError> {
        let max_dim = self.limits.max_image_dimension;
        let mut survivors = Vec::with_capacity(entries.len());
        let mut rejected = Vec::new();
        let (mut max_width, mut max_height) = (0u32, 0u32);

        for mut entry in entries {
            let header = match decode::probe(&entry.path) {
                Ok(header) => header,
                Err(e) => {
                    tracing::warn!("Failed to load image {:?}: {}", entry.path, e);
                    rejected.push(ImageFailure::new(&entry.path, "bounds", e.to_string()));
                    continue;
                }
            };

            if header.width > max_dim || header.height > max_dim {
                let err = PipelineError::ImageTooLarge {
                    path: entry.path.clone(),
                    width: header.width,
                    height: header.height,
                    max_dim,
                };
                tracing::warn!("Rejecting {}", err);
                rejected.push(ImageFailure::new(&entry.path, "bounds", err.to_string()));
                continue;
            }

            entry.width = header.width;
            entry.height = header.height;
            entry.has_alpha = header.has_alpha;
            max_width = max_width.max(header.width);
            max_height = max_height.max(header.height);
            survivors.push(entry);
        }

        if survivors.is_empty() {
            return Err(PipelineError::NoValidImages(source.to_path_buf()));
        }

        let canvas = Canvas::covering(max_width, max_height);
        tracing::debug!(
            "Largest dimensions {}x{}, canvas {}",
            max_width,
            max_height,
            canvas
        );

        Ok(BoundsOutcome {
            canvas,
            entries: survivors,
            rejected,
        })
    }
}
