//! External video codec integration.
//!
//! The pipeline only talks to the [`VideoCodec`] capability interface; the
//! ffmpeg backend is the one production implementation.

pub(crate) mod ffmpeg;
pub(crate) mod provider;

pub use ffmpeg::FfmpegCodec;
pub use provider::{CodecFactory, EncodeRequest, VideoCodec};
