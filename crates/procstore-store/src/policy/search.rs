use std::path::{Path, PathBuf};

use procstore_io::RetryingFileReader;
use procstore_types::Record;
use tracing::debug;

use super::{file_stem, StorageKind, StoragePolicy};
use crate::config::SearchPatternConfig;
use crate::error::{StoreError, StoreResult};

/// Policy for search patterns: every image has one exact size, and the
/// record name is the file name as-is.
#[derive(Clone, Debug)]
pub struct SearchPatternPolicy {
    working_dir: PathBuf,
    width: u32,
    height: u32,
}

impl SearchPatternPolicy {
    pub fn new(working_dir: impl Into<PathBuf>, width: u32, height: u32) -> Self {
        Self {
            working_dir: working_dir.into(),
            width,
            height,
        }
    }

    pub fn from_config(config: &SearchPatternConfig) -> Self {
        Self::new(&config.working_dir, config.width, config.height)
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }
}

impl StoragePolicy for SearchPatternPolicy {
    fn kind(&self) -> StorageKind {
        StorageKind::SearchPattern
    }

    fn working_directory(&self) -> &Path {
        &self.working_dir
    }

    fn decode(&self, path: &Path, reader: &RetryingFileReader) -> StoreResult<Record> {
        let content = reader.read_image(path)?;
        if content.width() != self.width || content.height() != self.height {
            return Err(StoreError::DimensionMismatch {
                path: path.to_path_buf(),
                expected_width: self.width,
                expected_height: self.height,
                actual_width: content.width(),
                actual_height: content.height(),
            });
        }
        debug!(path = %path.display(), "search pattern decoded");
        Ok(Record::new(content, file_stem(path))?)
    }

    fn selection_requires_entry(&self) -> bool {
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use procstore_io::save_bitmap;
    use procstore_types::{Cell, Grid};
    use std::time::Duration;

    fn reader() -> RetryingFileReader {
        RetryingFileReader::new(1, Duration::ZERO)
    }

    fn write(dir: &Path, name: &str, width: u32, height: u32) -> PathBuf {
        let path = dir.join(name);
        let grid = Grid::from_fn(width, height, |x, _| Cell::from_argb(255, x as u8, 0, 0)).unwrap();
        save_bitmap(&grid, &path).unwrap();
        path
    }

    #[test]
    fn exact_size_is_accepted_and_named_by_stem() {
        let dir = tempfile::tempdir().unwrap();
        let policy = SearchPatternPolicy::new(dir.path(), 3, 2);
        let path = write(dir.path(), "seven!4.bmp", 3, 2);

        let record = policy.decode(&path, &reader()).unwrap();
        assert_eq!(record.name(), "seven!4");
        assert_eq!((record.width(), record.height()), (3, 2));
    }

    #[test]
    fn other_size_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let policy = SearchPatternPolicy::new(dir.path(), 3, 2);
        let path = write(dir.path(), "wide.bmp", 4, 2);

        match policy.decode(&path, &reader()) {
            Err(StoreError::DimensionMismatch {
                actual_width,
                actual_height,
                ..
            }) => assert_eq!((actual_width, actual_height), (4, 2)),
            other => panic!("expected dimension mismatch, got {other:?}"),
        }
    }

    #[test]
    fn requires_indexed_selection() {
        let policy = SearchPatternPolicy::from_config(&SearchPatternConfig::default());
        assert!(policy.selection_requires_entry());
        assert_eq!(policy.kind(), StorageKind::SearchPattern);
        assert_eq!((policy.width(), policy.height()), (8, 8));
    }
}
