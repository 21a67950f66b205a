//! Image header probing and full decoding with content-based format detection.

use image::{DynamicImage, ImageDecoder as _, ImageFormat, ImageReader};
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use crate::error::PipelineError;

/// Geometry and pixel layout read from an image header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImageHeader {
    /// Image width in pixels
    pub width: u32,
    /// Image height in pixels
    pub height: u32,
    /// Whether the pixel format carries an alpha channel
    pub has_alpha: bool,
}

/// Open a reader with the format guessed from content, falling back to the
/// extension.
fn open_reader(path: &Path) -> Result<ImageReader<BufReader<File>>, PipelineError> {
    let mut reader = ImageReader::open(path)
        .map_err(|e| PipelineError::Decode {
            path: path.to_path_buf(),
            message: format!("Cannot open file: {}", e),
        })?
        .with_guessed_format()
        .map_err(|e| PipelineError::Decode {
            path: path.to_path_buf(),
            message: format!("Cannot detect image format: {}", e),
        })?;

    let format = match reader.format() {
        Some(f) => f,
        None => ImageFormat::from_path(path).map_err(|_| PipelineError::UnsupportedFormat {
            path: path.to_path_buf(),
            format: path
                .extension()
                .and_then(|e| e.to_str())
                .unwrap_or("unknown")
                .to_string(),
        })?,
    };

    reader.set_format(format);
    Ok(reader)
}

/// Read dimensions and alpha presence without decoding pixel data.
pub fn probe(path: &Path) -> Result<ImageHeader, PipelineError> {
    let decoder = open_reader(path)?.into_decoder().map_err(|e| PipelineError::Decode {
        path: path.to_path_buf(),
        message: e.to_string(),
    })?;

    let (width, height) = decoder.dimensions();
    Ok(ImageHeader {
        width,
        height,
        has_alpha: decoder.color_type().has_alpha(),
    })
}

/// Fully decode an image.
pub fn decode(path: &Path) -> Result<DynamicImage, PipelineError> {
    open_reader(path)?.decode().map_err(|e| PipelineError::Decode {
        path: path.to_path_buf(),
        message: e.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgb, RgbImage, Rgba, RgbaImage};

    #[test]
    fn test_probe_reports_alpha() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("alpha.png");
        RgbaImage::from_pixel(7, 3, Rgba([1, 2, 3, 4]))
            .save(&path)
            .unwrap();

        let header = probe(&path).unwrap();
        assert_eq!((header.width, header.height), (7, 3));
        assert!(header.has_alpha);
    }

    #[test]
    fn test_probe_reports_opaque() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("opaque.bmp");
        RgbImage::from_pixel(5, 9, Rgb([9, 9, 9])).save(&path).unwrap();

        let header = probe(&path).unwrap();
        assert_eq!((header.width, header.height), (5, 9));
        assert!(!header.has_alpha);
    }

    #[test]
    fn test_format_detected_by_content() {
        // A PNG saved under a .jpg name is still detected as PNG
        let dir = tempfile::tempdir().unwrap();
        let png = dir.path().join("real.png");
        RgbImage::new(4, 4).save(&png).unwrap();
        let misnamed = dir.path().join("misnamed.jpg");
        std::fs::copy(&png, &misnamed).unwrap();

        assert_eq!(probe(&misnamed).unwrap().width, 4);
        assert_eq!(decode(&misnamed).unwrap().width(), 4);
    }

    #[test]
    fn test_decode_garbage_fails() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("garbage.png");
        std::fs::write(&path, [0x89, b'P', b'N', b'G', 0, 0, 0]).unwrap();

        assert!(matches!(decode(&path), Err(PipelineError::Decode { .. })));
    }
}
