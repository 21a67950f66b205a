//! Shared helpers for pipeline tests.

#![allow(dead_code)]

use async_trait::async_trait;
use framepack_core::{CodecError, Config, EncodeRequest, VideoCodec};
use image::{Rgb, RgbImage, Rgba, RgbaImage};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

/// Codec double that "encodes" by copying PNG frames into a store directory.
///
/// Frames come back out numbered from `00001.png`, like ffmpeg's `%05d`
/// pattern. The container file itself only records that an encode ran.
pub struct PngStoreCodec {
    store: PathBuf,
    /// Frames to drop from the end on extraction
    drop_last: usize,
    /// Extra copies of the last frame on extraction
    duplicate_last: usize,
    encodes: Arc<Mutex<Vec<EncodeRequest>>>,
}

impl PngStoreCodec {
    pub fn new(store: &Path) -> Self {
        std::fs::create_dir_all(store.join("frames")).unwrap();
        Self {
            store: store.to_path_buf(),
            drop_last: 0,
            duplicate_last: 0,
            encodes: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Handle on the requests this codec receives, usable after it is boxed.
    pub fn encodes(&self) -> Arc<Mutex<Vec<EncodeRequest>>> {
        Arc::clone(&self.encodes)
    }

    pub fn dropping_last(mut self, n: usize) -> Self {
        self.drop_last = n;
        self
    }

    pub fn duplicating_last(mut self, n: usize) -> Self {
        self.duplicate_last = n;
        self
    }

    fn stored_frames(&self) -> Vec<PathBuf> {
        let mut frames: Vec<_> = std::fs::read_dir(self.store.join("frames"))
            .unwrap()
            .map(|e| e.unwrap().path())
            .collect();
        frames.sort();
        frames
    }
}

#[async_trait]
impl VideoCodec for PngStoreCodec {
    fn name(&self) -> &str {
        "png-store"
    }

    async fn is_available(&self) -> bool {
        true
    }

    async fn encode(&self, request: &EncodeRequest) -> Result<(), CodecError> {
        let manifest = std::fs::read_to_string(&request.manifest).unwrap();
        let base = request.manifest.parent().unwrap();

        for (position, line) in manifest.lines().enumerate() {
            let source = base.join(line_name(line));
            let frame = image::open(&source).unwrap();
            assert_eq!(
                (frame.width(), frame.height()),
                (request.canvas.width, request.canvas.height)
            );
            std::fs::copy(
                &source,
                self.store.join("frames").join(format!("{position:08}.png")),
            )
            .unwrap();
        }

        std::fs::copy(&request.metadata, self.store.join("attachment")).unwrap();
        std::fs::write(&request.output, b"png-store container").unwrap();
        self.encodes.lock().unwrap().push(request.clone());
        Ok(())
    }

    async fn extract_attachment(&self, _container: &Path, dest: &Path) -> Result<(), CodecError> {
        let attachment = self.store.join("attachment");
        if attachment.exists() {
            std::fs::copy(attachment, dest).unwrap();
        }
        Ok(())
    }

    async fn extract_frames(&self, _container: &Path, out_dir: &Path) -> Result<(), CodecError> {
        let mut frames = self.stored_frames();
        frames.truncate(frames.len().saturating_sub(self.drop_last));
        if let Some(last) = frames.last().cloned() {
            frames.extend(std::iter::repeat(last).take(self.duplicate_last));
        }

        for (i, frame) in frames.iter().enumerate() {
            std::fs::copy(frame, out_dir.join(format!("{:05}.png", i + 1))).unwrap();
        }
        Ok(())
    }
}

fn line_name(line: &str) -> String {
    line.trim_start_matches("file '")
        .trim_end_matches('\'')
        .replace(r"'\''", "'")
}

/// Config writing the container into `dir`, with a small worker pool.
pub fn config_in(dir: &Path) -> Config {
    let mut config = Config::default();
    config.encoder.output = dir.join("out.mkv");
    config.processing.parallel_workers = 3;
    config
}

/// Opaque image with a position-dependent pattern.
pub fn opaque(width: u32, height: u32, seed: u8) -> RgbImage {
    RgbImage::from_fn(width, height, |x, y| {
        Rgb([
            (x as u8).wrapping_mul(7).wrapping_add(seed),
            (y as u8).wrapping_mul(13),
            seed ^ (x as u8 ^ y as u8),
        ])
    })
}

/// Image with varying alpha, including fully transparent pixels.
pub fn translucent(width: u32, height: u32, seed: u8) -> RgbaImage {
    RgbaImage::from_fn(width, height, |x, y| {
        let alpha = if (x + y) % 5 == 0 { 0 } else { (x * 31 + y * 17) as u8 | 1 };
        Rgba([seed, (x as u8).wrapping_mul(3), (y as u8).wrapping_mul(5), alpha])
    })
}
