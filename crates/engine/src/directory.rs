//! Index directory layout
//!
//! An index directory holds one `fieldex.toml` and any number of segment
//! files named `<segment_id>.fidx`. Segments are opened in ascending
//! segment id order, which fixes their document bases.

use std::fs;
use std::io;
use std::path::Path;
use std::sync::Arc;

use fieldex_core::{Error, FieldexConfig, Result, CONFIG_FILE_NAME};
use fieldex_index::{IndexReader, Segment, SegmentedIndex};
use tracing::{info, warn};

/// File extension of segment files.
pub const SEGMENT_EXTENSION: &str = "fidx";

/// File name of the segment with `segment_id`
pub fn segment_file_name(segment_id: u64) -> String {
    format!("{:020}.{}", segment_id, SEGMENT_EXTENSION)
}

/// Open the configuration and every segment in `dir`.
///
/// The directory is created if needed; a missing `fieldex.toml` is written
/// with defaults.
///
/// # Errors
///
/// Returns an error if the directory cannot be read, the config is invalid
/// or the segments together exceed u32 document ids. A segment that fails
/// validation is [`Error::Corruption`].
pub fn open_index_dir(dir: &Path) -> Result<(FieldexConfig, SegmentedIndex)> {
    fs::create_dir_all(dir)?;

    let config_path = dir.join(CONFIG_FILE_NAME);
    FieldexConfig::write_default_if_missing(&config_path)?;
    let config = FieldexConfig::from_file(&config_path)?;

    let mut segments = Vec::new();
    for entry in fs::read_dir(dir)? {
        let path = entry?.path();
        if path.extension().and_then(|e| e.to_str()) != Some(SEGMENT_EXTENSION) {
            continue;
        }
        match Segment::open(&path) {
            Ok(segment) => segments.push(segment),
            Err(e) => {
                warn!(
                    target: "fieldex::engine",
                    path = %path.display(),
                    error = %e,
                    "Failed to open segment"
                );
                return Err(match e.kind() {
                    io::ErrorKind::InvalidData => {
                        Error::Corruption(format!("{}: {}", path.display(), e))
                    }
                    _ => e.into(),
                });
            }
        }
    }
    segments.sort_by_key(Segment::segment_id);

    let readers: Vec<Arc<dyn IndexReader>> = segments
        .into_iter()
        .map(|s| Arc::new(s) as Arc<dyn IndexReader>)
        .collect();
    let index = SegmentedIndex::new(readers)?;
    info!(
        target: "fieldex::engine",
        dir = %dir.display(),
        segments = index.leaves().len(),
        max_doc = index.max_doc(),
        "Opened index directory"
    );
    Ok((config, index))
}

#[cfg(test)]
mod tests {
    use super::*;
    use fieldex_index::{Document, SegmentBuilder};
    use tempfile::TempDir;

    fn write_segment(dir: &Path, id: u64, docs: u32) {
        let mut builder = SegmentBuilder::new(id);
        for i in 0..docs {
            builder.add_document(Document::new().field("id", i.to_string()));
        }
        builder
            .build()
            .unwrap()
            .write_to_file(&dir.join(segment_file_name(id)))
            .unwrap();
    }

    #[test]
    fn test_open_empty_dir_writes_config() {
        let dir = TempDir::new().unwrap();
        let (config, index) = open_index_dir(dir.path()).unwrap();
        assert_eq!(config, FieldexConfig::default());
        assert_eq!(index.max_doc(), 0);
        assert!(dir.path().join(CONFIG_FILE_NAME).exists());
    }

    #[test]
    fn test_segments_ordered_by_id() {
        let dir = TempDir::new().unwrap();
        write_segment(dir.path(), 9, 1);
        write_segment(dir.path(), 2, 3);
        fs::write(dir.path().join("notes.txt"), "ignored").unwrap();

        let (_, index) = open_index_dir(dir.path()).unwrap();
        assert_eq!(index.max_doc(), 4);
        assert_eq!(index.leaves()[0].reader().max_doc(), 3);
        assert_eq!(index.leaves()[1].doc_base(), 3);
    }

    #[test]
    fn test_corrupt_segment_fails_open() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join(segment_file_name(1)), b"not a segment").unwrap();
        assert!(matches!(open_index_dir(dir.path()), Err(Error::Corruption(_))));
    }

    #[test]
    fn test_invalid_config_fails_open() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join(CONFIG_FILE_NAME), "[sort]\nsample_ratio = 0\n").unwrap();
        assert!(open_index_dir(dir.path()).unwrap_err().to_string().contains("sample_ratio"));
    }
}
