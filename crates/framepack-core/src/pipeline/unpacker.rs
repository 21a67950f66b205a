//! Unpack orchestration: container back to the original image files.

use std::path::Path;
use std::time::Instant;

use crate::codec::{CodecFactory, VideoCodec};
use crate::config::Config;
use crate::error::{CodecError, PipelineError, Result};
use crate::types::{ProgressFn, UnpackReport};

use super::metadata::{MetadataCodec, ARTIFACT_NAME};
use super::restore::FrameRestorer;
use super::sequence::FrameSequencer;

/// Stages of an unpack run, in order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnpackStage {
    MetadataExtracted,
    FramesExtracted,
    Restored,
}

impl std::fmt::Display for UnpackStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            UnpackStage::MetadataExtracted => "metadata extracted",
            UnpackStage::FramesExtracted => "frames extracted",
            UnpackStage::Restored => "restored",
        };
        f.write_str(name)
    }
}

/// Restores the images held in a container.
pub struct Unpacker {
    config: Config,
    codec: Box<dyn VideoCodec>,
    progress: Option<ProgressFn>,
}

impl Unpacker {
    /// Create an unpacker using the configured codec backend.
    pub fn new(config: Config) -> Self {
        let codec = CodecFactory::create(&config.encoder);
        Self::with_codec(config, codec)
    }

    /// Create an unpacker with an explicit codec backend.
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

    /// Restore every frame of `container` into `output_dir`.
    pub async fn unpack(&self, container: &Path, output_dir: &Path) -> Result<UnpackReport> {
        let start = Instant::now();
        if !container.is_file() {
            return Err(PipelineError::FileNotFound(container.to_path_buf()).into());
        }
        if !self.codec.is_available().await {
            return Err(CodecError::NotAvailable(self.codec.name().to_string()).into());
        }

        let work = self.config.create_work_dir("framepack-unpack-")?;

        let artifact = work.path().join(ARTIFACT_NAME);
        self.codec.extract_attachment(container, &artifact).await?;
        if !artifact.is_file() {
            return Err(PipelineError::MetadataNotFound(container.to_path_buf()).into());
        }
        let table = MetadataCodec::read(&artifact)?;
        std::fs::remove_file(&artifact)?;
        log_stage(UnpackStage::MetadataExtracted);
        tracing::info!("Metadata describes {} frames", table.len());

        self.codec.extract_frames(container, work.path()).await?;
        let decoded = FrameSequencer::decoded_frames(work.path())?;
        log_stage(UnpackStage::FramesExtracted);
        tracing::info!("Decoded {} frames", decoded.len());

        let decoded_count = decoded.len();
        let pairing = FrameSequencer::pair(decoded, &table);
        let restored = FrameRestorer::new(self.config.processing.parallel_workers)
            .with_progress(self.progress.clone())
            .restore_all(pairing.pairs, output_dir)
            .await?;
        log_stage(UnpackStage::Restored);

        if self.config.general.keep_work_dir {
            let kept = work.keep();
            tracing::info!("Kept working directory {:?}", kept);
        }

        let report = UnpackReport {
            output_dir: output_dir.to_path_buf(),
            expected: table.len(),
            decoded: decoded_count,
            restored: restored.restored.len(),
            missing: pairing.missing,
            excess: pairing.excess.len(),
            failures: restored.failures,
            elapsed: start.elapsed(),
        };
        tracing::info!(
            "Restored {}/{} images into {:?} in {:?}",
            report.restored,
            report.expected,
            report.output_dir,
            report.elapsed
        );
        Ok(report)
    }
}

fn log_stage(stage: UnpackStage) {
    tracing::info!("Unpack stage: {stage}");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::EncodeRequest;
    use async_trait::async_trait;

    /// A container without an attachment.
    struct BareCodec;

    #[async_trait]
    impl VideoCodec for BareCodec {
        fn name(&self) -> &str {
            "bare"
        }
        async fn is_available(&self) -> bool {
            true
        }
        async fn encode(&self, _: &EncodeRequest) -> std::result::Result<(), CodecError> {
            Ok(())
        }
        async fn extract_attachment(
            &self,
            _: &Path,
            _: &Path,
        ) -> std::result::Result<(), CodecError> {
            Ok(())
        }
        async fn extract_frames(&self, _: &Path, _: &Path) -> std::result::Result<(), CodecError> {
            Ok(())
        }
    }

    #[tokio::test]
    async fn test_missing_container_is_reported() {
        let out = tempfile::tempdir().unwrap();
        let unpacker = Unpacker::with_codec(Config::default(), Box::new(BareCodec));

        let err = unpacker
            .unpack(&out.path().join("nope.mkv"), out.path())
            .await
            .unwrap_err();
        assert!(err.to_string().contains("File not found"));
    }

    #[tokio::test]
    async fn test_container_without_metadata_fails() {
        let dir = tempfile::tempdir().unwrap();
        let container = dir.path().join("plain.mkv");
        std::fs::write(&container, b"not really a video").unwrap();
        let unpacker = Unpacker::with_codec(Config::default(), Box::new(BareCodec));

        let err = unpacker
            .unpack(&container, &dir.path().join("out"))
            .await
            .unwrap_err();
        assert!(err.to_string().contains("Metadata not found"));
        assert!(!dir.path().join("out").exists());
    }

    #[test]
    fn test_stage_display() {
        assert_eq!(UnpackStage::FramesExtracted.to_string(), "frames extracted");
    }
}
