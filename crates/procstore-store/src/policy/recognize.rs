use std::ops::RangeInclusive;
use std::path::{Path, PathBuf};

use procstore_io::RetryingFileReader;
use procstore_names::parse_name;
use procstore_types::Record;
use tracing::debug;

use super::{file_stem, SelectionAction, StorageKind, StoragePolicy};
use crate::config::RecognizeTargetConfig;
use crate::error::{Axis, StoreError, StoreResult};

/// Policy for recognize targets: image sizes fall within inclusive ranges,
/// checked per axis, and the record name is the de-masked file name.
///
/// Reloading a file that is already indexed selects it.
#[derive(Clone, Debug)]
pub struct RecognizeTargetPolicy {
    working_dir: PathBuf,
    widths: RangeInclusive<u32>,
    heights: RangeInclusive<u32>,
}

impl RecognizeTargetPolicy {
    pub fn new(
        working_dir: impl Into<PathBuf>,
        widths: RangeInclusive<u32>,
        heights: RangeInclusive<u32>,
    ) -> Self {
        Self {
            working_dir: working_dir.into(),
            widths,
            heights,
        }
    }

    pub fn from_config(config: &RecognizeTargetConfig) -> Self {
        Self::new(
            &config.working_dir,
            config.min_width..=config.max_width,
            config.min_height..=config.max_height,
        )
    }

    fn check(path: &Path, axis: Axis, value: u32, range: &RangeInclusive<u32>) -> StoreResult<()> {
        if range.contains(&value) {
            return Ok(());
        }
        Err(StoreError::DimensionOutOfRange {
            path: path.to_path_buf(),
            axis,
            value,
            min: *range.start(),
            max: *range.end(),
        })
    }
}

impl StoragePolicy for RecognizeTargetPolicy {
    fn kind(&self) -> StorageKind {
        StorageKind::RecognizeTarget
    }

    fn working_directory(&self) -> &Path {
        &self.working_dir
    }

    fn decode(&self, path: &Path, reader: &RetryingFileReader) -> StoreResult<Record> {
        let content = reader.read_image(path)?;
        Self::check(path, Axis::Width, content.width(), &self.widths)?;
        Self::check(path, Axis::Height, content.height(), &self.heights)?;

        let tag = parse_name(&file_stem(path))?.base;
        debug!(path = %path.display(), tag = %tag, "recognize target decoded");
        Ok(Record::new(content, tag)?)
    }

    fn on_replace(&self, replaced: bool) -> SelectionAction {
        if replaced {
            SelectionAction::Select
        } else {
            SelectionAction::Keep
        }
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
        let grid = Grid::from_fn(width, height, |_, y| Cell::from_argb(255, 0, y as u8, 0)).unwrap();
        save_bitmap(&grid, &path).unwrap();
        path
    }

    #[test]
    fn bounds_are_inclusive() {
        let dir = tempfile::tempdir().unwrap();
        let policy = RecognizeTargetPolicy::new(dir.path(), 2..=4, 1..=3);
        for (w, h) in [(2, 1), (4, 3), (3, 2)] {
            let path = write(dir.path(), &format!("{w}x{h}.bmp"), w, h);
            assert!(policy.decode(&path, &reader()).is_ok(), "{w}x{h}");
        }
    }

    #[test]
    fn axes_are_checked_independently() {
        let dir = tempfile::tempdir().unwrap();
        let policy = RecognizeTargetPolicy::new(dir.path(), 2..=4, 1..=3);

        let tall = write(dir.path(), "tall.bmp", 3, 5);
        match policy.decode(&tall, &reader()) {
            Err(StoreError::DimensionOutOfRange { axis, value, min, max, .. }) => {
                assert_eq!((axis, value, min, max), (Axis::Height, 5, 1, 3));
            }
            other => panic!("expected height out of range, got {other:?}"),
        }

        let narrow = write(dir.path(), "narrow.bmp", 1, 2);
        assert!(matches!(
            policy.decode(&narrow, &reader()),
            Err(StoreError::DimensionOutOfRange { axis: Axis::Width, .. })
        ));
    }

    #[test]
    fn tag_is_demasked() {
        let dir = tempfile::tempdir().unwrap();
        let policy = RecognizeTargetPolicy::new(dir.path(), 1..=8, 1..=8);
        let path = write(dir.path(), "house!3.bmp", 2, 2);
        assert_eq!(policy.decode(&path, &reader()).unwrap().name(), "house");
    }

    #[test]
    fn replacing_selects() {
        let policy = RecognizeTargetPolicy::from_config(&RecognizeTargetConfig::default());
        assert_eq!(policy.on_replace(true), SelectionAction::Select);
        assert_eq!(policy.on_replace(false), SelectionAction::Keep);
        assert!(!policy.selection_requires_entry());
    }
}
