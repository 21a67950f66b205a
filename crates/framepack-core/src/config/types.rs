//! Sub-configuration structs with their defaults.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// General settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// Parent directory for per-run working directories (system temp if unset)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub work_dir: Option<PathBuf>,

    /// Keep the working directory (padded and decoded frames) after a run
    pub keep_work_dir: bool,
}

/// Processing settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ProcessingConfig {
    /// Number of parallel workers for padding and restoration
    pub parallel_workers: usize,

    /// Supported input extensions
    pub supported_formats: Vec<String>,
}

impl Default for ProcessingConfig {
    fn default() -> Self {
        Self {
            parallel_workers: 4,
            supported_formats: [
                "png", "jpg", "jpeg", "bmp", "gif", "webp", "tif", "tiff", "tga", "ico", "pnm",
                "qoi",
            ]
            .iter()
            .map(|s| s.to_string())
            .collect(),
        }
    }
}

/// Resource limits to protect against problematic inputs.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LimitsConfig {
    /// Maximum image dimension (width or height) admitted to the canvas
    pub max_image_dimension: u32,

    /// Maximum file size in megabytes
    pub max_file_size_mb: u64,
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            max_image_dimension: 4096,
            max_file_size_mb: 256,
        }
    }
}

/// Encoder backend profile.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EncoderProfile {
    /// libx264 software encode
    #[default]
    Software,
    /// h264_nvenc hardware encode
    Hardware,
    /// FFV1, bit-exact and alpha-preserving
    Ffv1,
}

impl std::fmt::Display for EncoderProfile {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EncoderProfile::Software => write!(f, "software"),
            EncoderProfile::Hardware => write!(f, "hardware"),
            EncoderProfile::Ffv1 => write!(f, "ffv1"),
        }
    }
}

/// External codec settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EncoderConfig {
    /// Backend profile
    pub profile: EncoderProfile,

    /// Constant rate factor (x264 / nvenc)
    pub crf: u32,

    /// Quantization parameter (x264 / nvenc)
    pub qp: u32,

    /// Encoder preset name
    pub preset: String,

    /// Frames per second used for both encode and frame extraction
    pub frame_rate: u32,

    /// Path or name of the ffmpeg binary
    pub ffmpeg_path: String,

    /// Container path, relative paths resolve against the current directory
    pub output: PathBuf,

    /// Upper bound on any single ffmpeg invocation, in seconds
    pub timeout_secs: u64,
}

impl Default for EncoderConfig {
    fn default() -> Self {
        Self {
            profile: EncoderProfile::Software,
            crf: 17,
            qp: 15,
            preset: "slow".to_string(),
            frame_rate: 1,
            ffmpeg_path: "ffmpeg".to_string(),
            output: PathBuf::from("output.mkv"),
            timeout_secs: 3600,
        }
    }
}

/// Logging settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level: error, warn, info, debug, trace
    pub level: String,

    /// Log format: "pretty" or "json"
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "pretty".to_string(),
        }
    }
}
