//! Catalog scanning: lists and orders the image set in a source directory.

use std::path::{Path, PathBuf};
use walkdir::WalkDir;

use crate::config::{LimitsConfig, ProcessingConfig};
use crate::error::PipelineError;
use crate::types::{ImageEntry, ImageFailure};

use super::decode;
use super::validate::Validator;

/// Scans a source directory for supported images.
pub struct FileDiscovery {
    config: ProcessingConfig,
    validator: Validator,
}

/// Result of scanning one directory.
#[derive(Debug, Default)]
pub struct ScanOutcome {
    /// Images in catalog order
    pub entries: Vec<ImageEntry>,
    /// Candidate files (supported extension) found
    pub candidates: usize,
    /// Candidates that failed to open as an image
    pub skipped: Vec<ImageFailure>,
}

impl FileDiscovery {
    /// Create a new scanner.
    pub fn new(config: ProcessingConfig, limits: LimitsConfig) -> Self {
        Self {
            config,
            validator: Validator::new(limits),
        }
    }

    /// Scan the regular files directly inside `dir`.
    ///
    /// Entries are sorted by file name. Files that fail validation or whose
    /// header can't be read are skipped and reported. Only an unreadable
    /// directory is an error.
    pub fn scan(&self, dir: &Path) -> Result<ScanOutcome, PipelineError> {
        let candidates = self.candidates(dir)?;
        let mut outcome = ScanOutcome {
            candidates: candidates.len(),
            ..Default::default()
        };

        for path in candidates {
            let header = self
                .validator
                .validate(&path)
                .and_then(|_| decode::probe(&path));

            match header {
                Ok(header) => {
                    let file_name = file_name_of(&path);
                    outcome.entries.push(ImageEntry {
                        catalog_index: outcome.entries.len(),
                        path,
                        file_name,
                        width: header.width,
                        height: header.height,
                        has_alpha: header.has_alpha,
                    });
                }
                Err(e) => {
                    tracing::warn!("Skipping {:?}: {}", path, e);
                    outcome
                        .skipped
                        .push(ImageFailure::new(&path, "scan", e.to_string()));
                }
            }
        }

        Ok(outcome)
    }

    /// List supported files in `dir`, sorted by file name.
    fn candidates(&self, dir: &Path) -> Result<Vec<PathBuf>, PipelineError> {
        let unreadable = |message: String| PipelineError::DirectoryUnreadable {
            path: dir.to_path_buf(),
            message,
        };

        if !dir.is_dir() {
            return Err(unreadable("not a directory".to_string()));
        }

        let mut files = Vec::new();
        for entry in WalkDir::new(dir)
            .min_depth(1)
            .max_depth(1)
            .follow_links(true)
        {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) if e.depth() == 0 => return Err(unreadable(e.to_string())),
                Err(e) => {
                    // Dangling symlinks and the like
                    tracing::warn!("Skipping unreadable entry in {:?}: {}", dir, e);
                    continue;
                }
            };
            if entry.file_type().is_file() && self.is_supported(entry.path()) {
                files.push(entry.into_path());
            }
        }

        files.sort_by(|a, b| a.file_name().cmp(&b.file_name()));
        Ok(files)
    }

    /// Check if a file has a supported extension.
    fn is_supported(&self, path: &Path) -> bool {
        path.extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| {
                self.config
                    .supported_formats
                    .iter()
                    .any(|fmt| fmt.eq_ignore_ascii_case(ext))
            })
            .unwrap_or(false)
    }
}

fn file_name_of(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "unknown".to_string())
}
