//! Pack orchestration: source directory to a single video container.

use std::path::Path;
use std::time::Instant;

use crate::codec::{CodecFactory, EncodeRequest, VideoCodec};
use crate::config::Config;
use crate::error::{CodecError, PipelineError, Result};
use crate::types::{PackReport, ProgressFn};

use super::bounds::BoundingBox;
use super::discovery::FileDiscovery;
use super::metadata::{MetadataCodec, ARTIFACT_NAME};
use super::pad::FramePadder;
use super::sequence::FrameSequencer;

/// Stages of a pack run, in order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PackStage {
    Scanning,
    BoundingBoxComputed,
    FramesPadded,
    MetadataSerialized,
    ManifestWritten,
    Encoded,
}

impl std::fmt::Display for PackStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            PackStage::Scanning => "scanning",
            PackStage::BoundingBoxComputed => "bounding box computed",
            PackStage::FramesPadded => "frames padded",
            PackStage::MetadataSerialized => "metadata serialized",
            PackStage::ManifestWritten => "manifest written",
            PackStage::Encoded => "encoded",
        };
        f.write_str(name)
    }
}

/// Packs a directory of images into one container.
pub struct Packer {
    config: Config,
    codec: Box<dyn VideoCodec>,
    progress: Option<ProgressFn>,
}

impl Packer {
    /// Create a packer using the configured codec backend.
    pub fn new(config: Config) -> Self {
        let codec = CodecFactory::create(&config.encoder);
        Self::with_codec(config, codec)
    }

    /// Create a packer with an explicit codec backend.
    pub fn with_codec(config: Config, codec: Box<dyn VideoCodec>) -> Self {
        Self {
            config,
            codec,
            progress: None,
        }
    }

    pub fn with_progress(mut self, progress: Option<ProgressFn>) -> Self {
        self.progress = progress;
        self
    }

    /// Pack every supported image directly inside `source`.
    ///
    /// Writes the container to `encoder.output`, replacing any existing
    /// file. Images that fail along the way are left out and listed in the
    /// report.
    pub async fn pack(&self, source: &Path) -> Result<PackReport> {
        let start = Instant::now();
        self.ensure_codec().await?;

        log_stage(PackStage::Scanning);
        let discovery =
            FileDiscovery::new(self.config.processing.clone(), self.config.limits.clone());
        let scan = discovery.scan(source)?;
        tracing::info!(
            "Found {} images ({} candidates) in {:?}",
            scan.entries.len(),
            scan.candidates,
            source
        );
        let mut failures = scan.skipped;

        let bounds = BoundingBox::new(self.config.limits.clone()).compute(source, scan.entries)?;
        failures.extend(bounds.rejected);
        log_stage(PackStage::BoundingBoxComputed);
        tracing::info!(
            "Canvas {} for {} images",
            bounds.canvas,
            bounds.entries.len()
        );

        let work = self.config.create_work_dir("framepack-pack-")?;
        let padded = FramePadder::new(self.config.processing.parallel_workers)
            .with_progress(self.progress.clone())
            .pad_all(bounds.entries, bounds.canvas, work.path())
            .await?;
        failures.extend(padded.failures);
        if padded.frames.is_empty() {
            return Err(PipelineError::NoValidImages(source.to_path_buf()).into());
        }
        log_stage(PackStage::FramesPadded);

        let metadata = work.path().join(ARTIFACT_NAME);
        MetadataCodec::write(&padded.table, &metadata)?;
        log_stage(PackStage::MetadataSerialized);

        let manifest = FrameSequencer::write_manifest(work.path(), &padded.frames)?;
        log_stage(PackStage::ManifestWritten);

        let output = self.config.output_path();
        prepare_output(&output)?;
        let request = EncodeRequest {
            manifest,
            metadata,
            canvas: bounds.canvas,
            frame_rate: self.config.encoder.frame_rate,
            output: output.clone(),
        };
        if let Err(e) = self.codec.encode(&request).await {
            discard_partial(&output);
            return Err(e.into());
        }
        log_stage(PackStage::Encoded);

        if self.config.general.keep_work_dir {
            let kept = work.keep();
            tracing::info!("Kept working directory {:?}", kept);
        }

        let report = PackReport {
            container: output,
            canvas: bounds.canvas,
            frames: padded.frames.len(),
            scanned: scan.candidates,
            failures,
            elapsed: start.elapsed(),
        };
        tracing::info!(
            "Packed {} frames into {:?} in {:?}",
            report.frames,
            report.container,
            report.elapsed
        );
        Ok(report)
    }

    async fn ensure_codec(&self) -> std::result::Result<(), CodecError> {
        if self.codec.is_available().await {
            Ok(())
        } else {
            Err(CodecError::NotAvailable(self.codec.name().to_string()))
        }
    }
}

fn log_stage(stage: PackStage) {
    tracing::info!("Pack stage: {stage}");
}

/// Remove an existing container and make sure its directory exists.
fn prepare_output(output: &Path) -> std::io::Result<()> {
    if output.exists() {
        tracing::debug!("Replacing existing container {:?}", output);
        std::fs::remove_file(output)?;
    }
    match output.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => std::fs::create_dir_all(parent),
        _ => Ok(()),
    }
}

fn discard_partial(output: &Path) {
    if output.exists() {
        if let Err(e) = std::fs::remove_file(output) {
            tracing::warn!("Could not remove partial container {:?}: {}", output, e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use image::RgbImage;

    struct UnavailableCodec;

    #[async_trait]
    impl VideoCodec for UnavailableCodec {
        fn name(&self) -> &str {
            "missing"
        }
        async fn is_available(&self) -> bool {
            false
        }
        async fn encode(&self, _: &EncodeRequest) -> std::result::Result<(), CodecError> {
            unreachable!("encode must not run")
        }
        async fn extract_attachment(
            &self,
            _: &Path,
            _: &Path,
        ) -> std::result::Result<(), CodecError> {
            unreachable!()
        }
        async fn extract_frames(
            &self,
            _: &Path,
            _: &Path,
        ) -> std::result::Result<(), CodecError> {
            unreachable!()
        }
    }

    /// Writes a partial container, then fails.
    struct FailingCodec;

    #[async_trait]
    impl VideoCodec for FailingCodec {
        fn name(&self) -> &str {
            "failing"
        }
        async fn is_available(&self) -> bool {
            true
        }
        async fn encode(&self, request: &EncodeRequest) -> std::result::Result<(), CodecError> {
            std::fs::write(&request.output, b"partial").unwrap();
            Err(CodecError::NotAvailable("failing".into()))
        }
        async fn extract_attachment(
            &self,
            _: &Path,
            _: &Path,
        ) -> std::result::Result<(), CodecError> {
            unreachable!()
        }
        async fn extract_frames(
            &self,
            _: &Path,
            _: &Path,
        ) -> std::result::Result<(), CodecError> {
            unreachable!()
        }
    }

    #[test]
    fn test_stage_display() {
        assert_eq!(PackStage::BoundingBoxComputed.to_string(), "bounding box computed");
    }

    #[tokio::test]
    async fn test_unavailable_codec_fails_before_scanning() {
        let source = tempfile::tempdir().unwrap();
        let packer = Packer::with_codec(Config::default(), Box::new(UnavailableCodec));

        let err = packer.pack(source.path()).await.unwrap_err();
        assert!(err.to_string().contains("missing is not available"));
    }

    #[tokio::test]
    async fn test_failed_encode_removes_partial_container() {
        let source = tempfile::tempdir().unwrap();
        let out = tempfile::tempdir().unwrap();
        RgbImage::new(4, 4).save(source.path().join("a.png")).unwrap();

        let mut config = Config::default();
        config.encoder.output = out.path().join("video.mkv");
        let packer = Packer::with_codec(config, Box::new(FailingCodec));

        assert!(packer.pack(source.path()).await.is_err());
        assert!(!out.path().join("video.mkv").exists());
    }

    #[test]
    fn test_prepare_output_replaces_existing_file() {
        let dir = tempfile::tempdir().unwrap();
        let output = dir.path().join("nested").join("out.mkv");
        std::fs::create_dir_all(output.parent().unwrap()).unwrap();
        std::fs::write(&output, b"old").unwrap();

        prepare_output(&output).unwrap();
        assert!(!output.exists());
        assert!(output.parent().unwrap().is_dir());
    }
}
