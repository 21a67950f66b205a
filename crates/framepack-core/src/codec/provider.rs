//! Video codec trait and request types.
//!
//! Defines the interface every backend implements, plus the factory that
//! builds the configured backend.

use async_trait::async_trait;
use std::path::{Path, PathBuf};

use crate::config::EncoderConfig;
use crate::error::CodecError;
use crate::types::Canvas;

/// Everything an encoder needs to produce a container.
#[derive(Debug, Clone)]
pub struct EncodeRequest {
    /// Concat manifest listing frames in sequence order
    pub manifest: PathBuf,
    /// Metadata artifact to attach
    pub metadata: PathBuf,
    /// Frame size
    pub canvas: Canvas,
    /// Frames per second
    pub frame_rate: u32,
    /// Container to write
    pub output: PathBuf,
}

/// Trait that all codec backends implement.
///
/// Uses `async_trait` so the pipeline can hold a `Box<dyn VideoCodec>`.
#[async_trait]
pub trait VideoCodec: Send + Sync {
    /// Backend name for logging.
    fn name(&self) -> &str;

    /// Check whether the backend can run at all.
    async fn is_available(&self) -> bool;

    /// Encode the manifest's frames into `request.output`, attaching the
    /// metadata artifact.
    async fn encode(&self, request: &EncodeRequest) -> Result<(), CodecError>;

    /// Write the container's attachment to `dest`.
    ///
    /// An absent attachment is not an error here; callers check for `dest`.
    async fn extract_attachment(&self, container: &Path, dest: &Path) -> Result<(), CodecError>;

    /// Decode every stored frame into `out_dir` as `%05d.png`, numbered
    /// from 1, independent of the rate the container was encoded at.
    async fn extract_frames(&self, container: &Path, out_dir: &Path) -> Result<(), CodecError>;
}

/// Factory that creates the configured codec backend.
pub struct CodecFactory;

impl CodecFactory {
    pub fn create(config: &EncoderConfig) -> Box<dyn VideoCodec> {
        Box::new(super::ffmpeg::FfmpegCodec::from_config(config))
    }
}
