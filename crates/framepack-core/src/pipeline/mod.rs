//! Pack and unpack pipeline components.
//!
//! Pack stages:
//! - **discovery**: Scan the source directory into a sorted catalog
//! - **validate**: Size and magic-byte pre-checks
//! - **bounds**: Compute the shared even canvas
//! - **pad**: Composite images onto the canvas, assign sequence indices
//! - **metadata**: Gzip-compressed JSON artifact codec
//! - **sequence**: Concat manifest and decoded-frame pairing
//! - **packer** / **unpacker**: Orchestrate the stages around the codec
//! - **restore**: Crop decoded frames back to the originals
//! - **verify**: Compare originals with restored files
//! - **batch**: Bounded worker pool shared by the per-image stages

pub mod batch;
pub mod bounds;
pub mod decode;
pub mod discovery;
pub mod metadata;
pub mod pad;
pub mod packer;
pub mod restore;
pub mod sequence;
pub mod unpacker;
pub mod validate;
pub mod verify;

// Re-exports for convenient access
pub use bounds::{BoundingBox, BoundsOutcome};
pub use discovery::{FileDiscovery, ScanOutcome};
pub use metadata::MetadataCodec;
pub use pad::{FramePadder, PadOutcome};
pub use packer::{PackStage, Packer};
pub use restore::{FrameRestorer, RestoreOutcome};
pub use sequence::{FramePair, FramePairing, FrameSequencer};
pub use unpacker::{UnpackStage, Unpacker};
pub use validate::Validator;
pub use verify::Verifier;
