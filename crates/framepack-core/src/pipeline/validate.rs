//! Input validation before an image header is parsed.

use std::io::Read;
use std::path::Path;

use crate::config::LimitsConfig;
use crate::error::PipelineError;

/// Extensions whose formats carry no leading signature.
const HEADERLESS_EXTENSIONS: &[&str] = &["tga"];

/// Validates files before they enter the catalog.
pub struct Validator {
    limits: LimitsConfig,
}

impl Validator {
    /// Create a new validator with the given limits.
    pub fn new(limits: LimitsConfig) -> Self {
        Self { limits }
    }

    /// Perform quick validation before reading the image header.
    ///
    /// Checks:
    /// - File exists and is readable
    /// - File size is within limits
    /// - File has valid image magic bytes (unless the format has none)
    pub fn validate(&self, path: &Path) -> Result<(), PipelineError> {
        if !path.exists() {
            return Err(PipelineError::FileNotFound(path.to_path_buf()));
        }

        let metadata = std::fs::metadata(path).map_err(|e| PipelineError::Decode {
            path: path.to_path_buf(),
            message: format!("Cannot read metadata: {}", e),
        })?;

        let max_bytes = self.limits.max_file_size_mb * 1024 * 1024;
        if metadata.len() > max_bytes {
            return Err(PipelineError::FileTooLarge {
                path: path.to_path_buf(),
                size_mb: metadata.len() / (1024 * 1024),
                max_mb: self.limits.max_file_size_mb,
            });
        }

        if !Self::is_headerless(path) {
            self.check_magic_bytes(path)?;
        }

        Ok(())
    }

    fn is_headerless(path: &Path) -> bool {
        path.extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| {
                HEADERLESS_EXTENSIONS
                    .iter()
                    .any(|h| h.eq_ignore_ascii_case(ext))
            })
            .unwrap_or(false)
    }

    /// Check file magic bytes to verify it's a valid image format.
    fn check_magic_bytes(&self, path: &Path) -> Result<(), PipelineError> {
        let mut file = std::fs::File::open(path).map_err(|e| PipelineError::Decode {
            path: path.to_path_buf(),
            message: format!("Cannot open file: {}", e),
        })?;

        let mut header = [0u8; 12];
        let bytes_read = file.read(&mut header).unwrap_or(0);

        if bytes_read < 4 {
            return Err(PipelineError::Decode {
                path: path.to_path_buf(),
                message: "File too small to be a valid image".to_string(),
            });
        }

        if !Self::is_valid_image_header(&header, bytes_read) {
            return Err(PipelineError::Decode {
                path: path.to_path_buf(),
                message: "Unrecognized image format (invalid magic bytes)".to_string(),
            });
        }

        Ok(())
    }

    /// Check if the header bytes match known image formats.
    fn is_valid_image_header(header: &[u8; 12], bytes_read: usize) -> bool {
        if bytes_read < 4 {
            return false;
        }

        // JPEG: FF D8 FF
        if header[..3] == [0xFF, 0xD8, 0xFF] {
            return true;
        }

        // PNG: 89 50 4E 47
        if header[..4] == [0x89, b'P', b'N', b'G'] {
            return true;
        }

        // GIF: GIF8
        if &header[..4] == b"GIF8" {
            return true;
        }

        // WebP: RIFF....WEBP
        if &header[..4] == b"RIFF" {
            if bytes_read >= 12 {
                return &header[8..12] == b"WEBP";
            }
            return true;
        }

        // BMP: BM
        if &header[..2] == b"BM" {
            return true;
        }

        // TIFF: II*\0 or MM\0*
        if header[..4] == [b'I', b'I', 0x2A, 0x00] || header[..4] == [b'M', b'M', 0x00, 0x2A] {
            return true;
        }

        // ICO: 00 00 01 00
        if header[..4] == [0x00, 0x00, 0x01, 0x00] {
            return true;
        }

        // QOI: qoif
        if &header[..4] == b"qoif" {
            return true;
        }

        // PNM: P1..P7
        if header[0] == b'P' && (b'1'..=b'7').contains(&header[1]) {
            return true;
        }

        // AVIF/HEIF: ftyp box at offset 4
        if bytes_read >= 12 && &header[4..8] == b"ftyp" {
            return true;
        }

        false
    }
}
