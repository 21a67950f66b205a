//! Error types for the framepack pipeline.
//!
//! Errors are organized by stage so messages carry the context a user needs
//! (file paths, stage names, tool exit status). Per-image failures are
//! [`PipelineError`] values collected into stage reports; structural and
//! external-tool failures abort the run.

use std::path::PathBuf;
use std::process::ExitStatus;
use thiserror::Error;

/// Top-level error type for framepack operations.
#[derive(Error, Debug)]
pub enum FramePackError {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Pipeline processing errors
    #[error("Pipeline error: {0}")]
    Pipeline(#[from] PipelineError),

    /// External codec errors
    #[error("Codec error: {0}")]
    Codec(#[from] CodecError),

    /// General I/O errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Configuration-specific errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Failed to read the config file from disk
    #[error("Failed to read config file: {0}")]
    ReadError(#[from] std::io::Error),

    /// Failed to parse TOML configuration
    #[error("Failed to parse config: {0}")]
    ParseError(#[from] toml::de::Error),

    /// Configuration values are invalid
    #[error("Invalid configuration: {0}")]
    ValidationError(String),
}

/// Pipeline processing errors, organized by stage.
#[derive(Error, Debug)]
pub enum PipelineError {
    /// Image could not be opened or decoded
    #[error("Decode error for {path}: {message}")]
    Decode { path: PathBuf, message: String },

    /// Compositing or writing a padded frame failed
    #[error("Padding failed for {path}: {message}")]
    Pad { path: PathBuf, message: String },

    /// Cropping or saving a restored image failed
    #[error("Restore failed for {path}: {message}")]
    Restore { path: PathBuf, message: String },

    /// File exceeds size limit
    #[error("File too large: {path} ({size_mb}MB > {max_mb}MB)")]
    FileTooLarge {
        path: PathBuf,
        size_mb: u64,
        max_mb: u64,
    },

    /// Image dimensions exceed limit
    #[error("Image too large: {path} ({width}x{height} > {max_dim})")]
    ImageTooLarge {
        path: PathBuf,
        width: u32,
        height: u32,
        max_dim: u32,
    },

    /// Unsupported image format
    #[error("Unsupported format for {path}: {format}")]
    UnsupportedFormat { path: PathBuf, format: String },

    /// Recorded filename cannot be used as an output name
    #[error("Invalid output filename {filename:?} for frame {index}")]
    InvalidFilename { index: u32, filename: String },

    /// File not found
    #[error("File not found: {0}")]
    FileNotFound(PathBuf),

    /// Source or output directory cannot be listed
    #[error("Cannot read directory {path}: {message}")]
    DirectoryUnreadable { path: PathBuf, message: String },

    /// Reading or writing intermediate files in the working directory failed
    #[error("Working directory error at {path}: {message}")]
    WorkDir { path: PathBuf, message: String },

    /// No image survived scanning and bounds checks
    #[error("No valid images found in {0}")]
    NoValidImages(PathBuf),

    /// The metadata attachment was not produced by extraction
    #[error("Metadata not found in container {0}")]
    MetadataNotFound(PathBuf),

    /// The metadata artifact could not be decompressed or parsed
    #[error("Metadata artifact is corrupt: {0}")]
    MetadataCorrupt(String),
}

/// Failures of the external codec process.
#[derive(Error, Debug)]
pub enum CodecError {
    /// The codec binary could not be started
    #[error("Failed to spawn {tool} (is it installed and on PATH?): {source}")]
    Spawn {
        tool: String,
        #[source]
        source: std::io::Error,
    },

    /// The codec exited with a non-zero status
    #[error("{tool} {operation} failed with {status}: {stderr_tail}")]
    Failed {
        tool: String,
        operation: String,
        status: ExitStatus,
        stderr_tail: String,
    },

    /// The codec did not finish within the configured timeout
    #[error("{tool} {operation} timed out after {timeout_secs}s")]
    Timeout {
        tool: String,
        operation: String,
        timeout_secs: u64,
    },

    /// The codec binary is missing or unusable
    #[error("{0} is not available")]
    NotAvailable(String),
}

/// Convenience type alias for framepack results.
pub type Result<T> = std::result::Result<T, FramePackError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_image_too_large_message() {
        let err = PipelineError::ImageTooLarge {
            path: PathBuf::from("huge.png"),
            width: 5000,
            height: 10,
            max_dim: 4096,
        };
        assert_eq!(
            err.to_string(),
            "Image too large: huge.png (5000x10 > 4096)"
        );
    }

    #[test]
    fn test_codec_error_wraps_into_top_level() {
        let err: FramePackError = CodecError::NotAvailable("ffmpeg".into()).into();
        assert_eq!(err.to_string(), "Codec error: ffmpeg is not available");
    }

    #[test]
    fn test_pipeline_error_wraps_into_top_level() {
        let err: FramePackError = PipelineError::MetadataNotFound(PathBuf::from("a.mkv")).into();
        assert!(err.to_string().contains("Metadata not found"));
    }
}
