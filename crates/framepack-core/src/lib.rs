//! Framepack Core - pack image collections into a single video container.
//!
//! Every image in a directory is padded onto one shared canvas, encoded as a
//! frame of a video, and described by a compressed metadata artifact
//! attached to the container. Unpacking reverses the process and restores
//! each image under its original name and size.
//!
//! # Architecture
//!
//! ```text
//! Pack:   Scan → Bounding box → Pad → Metadata + Manifest → Encode → container
//! Unpack: container → Attachment + Frames → Pair → Crop → files
//! ```
//!
//! # Usage
//!
//! ```rust,ignore
//! use framepack_core::{Config, Packer, Unpacker};
//!
//! #[tokio::main]
//! async fn main() -> framepack_core::Result<()> {
//!     let config = Config::load()?;
//!     let report = Packer::new(config.clone()).pack("./images".as_ref()).await?;
//!     println!("Packed {} frames", report.frames);
//!
//!     Unpacker::new(config).unpack(&report.container, "./restored".as_ref()).await?;
//!     Ok(())
//! }
//! ```

// Module declarations
pub mod codec;
pub mod config;
pub mod error;
pub mod pipeline;
pub mod types;

// Re-exports for convenient access
pub use codec::{CodecFactory, EncodeRequest, FfmpegCodec, VideoCodec};
pub use config::{Config, EncoderProfile};
pub use error::{CodecError, ConfigError, FramePackError, PipelineError, Result};
pub use pipeline::{Packer, Unpacker, Verifier};
pub use types::{
    Canvas, FrameMetadataRecord, ImageEntry, ImageFailure, MetadataTable, PackReport,
    ProgressEvent, ProgressFn, UnpackReport, VerifyReport,
};

/// Library version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
