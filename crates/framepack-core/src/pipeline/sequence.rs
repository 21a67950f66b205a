//! Frame sequencing: the concat manifest on pack, index pairing on unpack.

use std::io::Write;
use std::path::{Path, PathBuf};

use crate::error::PipelineError;
use crate::types::{FrameMetadataRecord, MetadataTable};

/// File name of the concat manifest inside working directories.
pub const MANIFEST_NAME: &str = "file_list.txt";

/// Orders frames for the encoder and maps decoded frames back to indices.
pub struct FrameSequencer;

/// Decoded frames matched with their metadata.
#[derive(Debug, Default)]
pub struct FramePairing {
    /// (decoded frame, sequence index, record), ascending by index
    pub pairs: Vec<FramePair>,
    /// Indices with no decoded frame
    pub missing: Vec<u32>,
    /// Decoded frames beyond the metadata count, left untouched
    pub excess: Vec<PathBuf>,
}

/// One decoded frame and the record describing it.
#[derive(Debug, Clone)]
pub struct FramePair {
    pub frame: PathBuf,
    pub index: u32,
    pub record: FrameMetadataRecord,
}

impl FrameSequencer {
    /// Write the concat manifest for `frames` (already in index order).
    ///
    /// Names are written relative to the manifest, one `file '<name>'`
    /// directive per line.
    pub fn write_manifest(work_dir: &Path, frames: &[PathBuf]) -> Result<PathBuf, PipelineError> {
        let path = work_dir.join(MANIFEST_NAME);
        let write_err = |e: std::io::Error| PipelineError::WorkDir {
            path: path.clone(),
            message: format!("Cannot write manifest: {e}"),
        };

        let file = std::fs::File::create(&path).map_err(write_err)?;
        let mut writer = std::io::BufWriter::new(file);
        for frame in frames {
            let name = frame
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default();
            writeln!(writer, "file '{}'", escape_concat(&name)).map_err(write_err)?;
        }
        writer.flush().map_err(write_err)?;

        tracing::debug!("Wrote manifest with {} frames to {:?}", frames.len(), path);
        Ok(path)
    }

    /// List decoded frames in `dir`: numerically named `.png` files, sorted
    /// by their number.
    pub fn decoded_frames(dir: &Path) -> Result<Vec<PathBuf>, PipelineError> {
        let entries = std::fs::read_dir(dir).map_err(|e| PipelineError::DirectoryUnreadable {
            path: dir.to_path_buf(),
            message: e.to_string(),
        })?;

        let mut frames: Vec<(u64, PathBuf)> = entries
            .filter_map(|entry| entry.ok())
            .map(|entry| entry.path())
            .filter(|path| path.is_file())
            .filter_map(|path| frame_number(&path).map(|n| (n, path)))
            .collect();

        frames.sort();
        Ok(frames.into_iter().map(|(_, path)| path).collect())
    }

    /// Pair sorted decoded frames with metadata by position.
    ///
    /// The k-th frame belongs to sequence index k. A count mismatch is
    /// reported loudly but is not an error.
    pub fn pair(frames: Vec<PathBuf>, table: &MetadataTable) -> FramePairing {
        if frames.len() != table.len() {
            tracing::warn!(
                "Frame count mismatch: {} decoded frames for {} metadata records",
                frames.len(),
                table.len()
            );
        }

        let mut pairing = FramePairing::default();
        let mut frames = frames.into_iter();

        for (&index, record) in table {
            match frames.next() {
                Some(frame) => pairing.pairs.push(FramePair {
                    frame,
                    index,
                    record: record.clone(),
                }),
                None => {
                    tracing::warn!("Missing frame for index {} ({})", index, record.filename);
                    pairing.missing.push(index);
                }
            }
        }

        pairing.excess = frames.collect();
        if !pairing.excess.is_empty() {
            tracing::warn!(
                "{} decoded frames have no metadata and were left unprocessed",
                pairing.excess.len()
            );
        }

        pairing
    }
}

/// Escape a name for a single-quoted concat directive.
fn escape_concat(name: &str) -> String {
    name.replace('\'', r"'\''")
}

fn frame_number(path: &Path) -> Option<u64> {
    let is_png = path
        .extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("png"));
    if !is_png {
        return None;
    }
    let stem = path.file_stem()?.to_str()?;
    if stem.is_empty() || !stem.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    stem.parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table(n: u32) -> MetadataTable {
        (0..n)
            .map(|i| {
                (
                    i,
                    FrameMetadataRecord {
                        filename: format!("img{i}.png"),
                        width: 10 + i,
                        height: 20,
                        has_alpha: i % 2 == 0,
                    },
                )
            })
            .collect()
    }

    fn touch(dir: &Path, name: &str) -> PathBuf {
        let path = dir.join(name);
        std::fs::write(&path, b"").unwrap();
        path
    }

    #[test]
    fn test_manifest_lists_frames_in_order() {
        let dir = tempfile::tempdir().unwrap();
        let frames: Vec<_> = ["00000.png", "00001.png", "00002.png"]
            .iter()
            .map(|n| dir.path().join(n))
            .collect();

        let path = FrameSequencer::write_manifest(dir.path(), &frames).unwrap();
        let content = std::fs::read_to_string(path).unwrap();
        assert_eq!(
            content,
            "file '00000.png'\nfile '00001.png'\nfile '00002.png'\n"
        );
    }

    #[test]
    fn test_escape_concat_quotes() {
        assert_eq!(escape_concat("it's.png"), r"it'\''s.png");
    }

    #[test]
    fn test_decoded_frames_sorted_numerically() {
        let dir = tempfile::tempdir().unwrap();
        touch(dir.path(), "00010.png");
        touch(dir.path(), "00002.png");
        touch(dir.path(), "100000.png");
        touch(dir.path(), "99999.png");
        touch(dir.path(), "metadata.json.gz");
        touch(dir.path(), "cat.png");

        let names: Vec<_> = FrameSequencer::decoded_frames(dir.path())
            .unwrap()
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, ["00002.png", "00010.png", "99999.png", "100000.png"]);
    }

    #[test]
    fn test_pair_exact_count() {
        let frames = vec![PathBuf::from("00001.png"), PathBuf::from("00002.png")];
        let pairing = FrameSequencer::pair(frames, &table(2));

        assert_eq!(pairing.pairs.len(), 2);
        assert_eq!(pairing.pairs[1].index, 1);
        assert_eq!(pairing.pairs[1].record.filename, "img1.png");
        assert_eq!(pairing.pairs[1].frame, PathBuf::from("00002.png"));
        assert!(pairing.missing.is_empty());
        assert!(pairing.excess.is_empty());
    }

    #[test]
    fn test_pair_fewer_frames_reports_missing() {
        let frames = vec![PathBuf::from("00001.png")];
        let pairing = FrameSequencer::pair(frames, &table(3));

        assert_eq!(pairing.pairs.len(), 1);
        assert_eq!(pairing.missing, vec![1, 2]);
    }

    #[test]
    fn test_pair_extra_frames_left_alone() {
        let frames: Vec<_> = (1..=4).map(|i| PathBuf::from(format!("{i:05}.png"))).collect();
        let pairing = FrameSequencer::pair(frames, &table(2));

        assert_eq!(pairing.pairs.len(), 2);
        assert_eq!(
            pairing.excess,
            vec![PathBuf::from("00003.png"), PathBuf::from("00004.png")]
        );
    }
}
