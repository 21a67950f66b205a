//! Metadata artifact codec: gzip-compressed JSON keyed by sequence index.
//!
//! The artifact is an object such as
//! `{"0": {"filename": "a.png", "width": 100, "height": 50, "has_alpha": false}}`.
//! It is the only thing that carries file names through the codec.

use flate2::read::GzDecoder;
use flate2::write::GzEncoder;
use flate2::Compression;
use std::io::{Read, Write};
use std::path::Path;

use crate::error::PipelineError;
use crate::types::MetadataTable;

/// File name of the artifact inside working directories.
pub const ARTIFACT_NAME: &str = "metadata.json.gz";

/// Media type the artifact is attached under.
pub const ARTIFACT_MIME_TYPE: &str = "application/gzip";

/// Serializes and compresses [`MetadataTable`]s.
pub struct MetadataCodec;

impl MetadataCodec {
    /// Encode a table to compressed bytes.
    pub fn encode(table: &MetadataTable) -> Result<Vec<u8>, PipelineError> {
        let json = serde_json::to_vec(table)
            .map_err(|e| PipelineError::MetadataCorrupt(format!("serialize: {e}")))?;

        let mut encoder = GzEncoder::new(Vec::new(), Compression::best());
        encoder
            .write_all(&json)
            .and_then(|_| encoder.finish())
            .map_err(|e| PipelineError::MetadataCorrupt(format!("compress: {e}")))
    }

    /// Decode compressed bytes back to a table.
    ///
    /// Rejects tables whose indices are not exactly `0..N`, since frames
    /// are paired with records by position.
    pub fn decode(bytes: &[u8]) -> Result<MetadataTable, PipelineError> {
        let mut json = Vec::new();
        GzDecoder::new(bytes)
            .read_to_end(&mut json)
            .map_err(|e| PipelineError::MetadataCorrupt(format!("decompress: {e}")))?;

        let table: MetadataTable = serde_json::from_slice(&json)
            .map_err(|e| PipelineError::MetadataCorrupt(format!("parse: {e}")))?;

        Self::check_dense(&table)?;
        Ok(table)
    }

    /// Write the artifact for `table` to `path`.
    pub fn write(table: &MetadataTable, path: &Path) -> Result<(), PipelineError> {
        let bytes = Self::encode(table)?;
        std::fs::write(path, bytes).map_err(|e| {
            PipelineError::MetadataCorrupt(format!("write {}: {e}", path.display()))
        })?;
        tracing::debug!("Wrote metadata for {} frames to {:?}", table.len(), path);
        Ok(())
    }

    /// Read and decode the artifact at `path`.
    pub fn read(path: &Path) -> Result<MetadataTable, PipelineError> {
        let bytes = std::fs::read(path).map_err(|e| {
            PipelineError::MetadataCorrupt(format!("read {}: {e}", path.display()))
        })?;
        Self::decode(&bytes)
    }

    fn check_dense(table: &MetadataTable) -> Result<(), PipelineError> {
        // BTreeMap keys are sorted, so dense means key == position
        for (position, index) in (0u32..).zip(table.keys()) {
            if *index != position {
                return Err(PipelineError::MetadataCorrupt(format!(
                    "frame indices are not contiguous: expected {position}, found {index}"
                )));
            }
        }
        Ok(())
    }
}
