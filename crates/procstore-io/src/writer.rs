use std::io::Write;
use std::path::Path;

use procstore_types::{Cell, Grid};
use tracing::debug;

use crate::codec::encode_bitmap;
use crate::error::{IoError, IoResult, SaveStage};

/// Save `content` to `dest` as a bitmap.
///
/// The bytes are written to a temporary file beside `dest`, flushed, and
/// then renamed over `dest`. Readers see either the old file or the new one.
/// On failure the temporary file is removed and `dest` is untouched.
pub fn save_bitmap(content: &Grid<Cell>, dest: &Path) -> IoResult<()> {
    let bytes = encode_bitmap(content).map_err(|source| IoError::InvalidContent {
        path: dest.to_path_buf(),
        source,
    })?;

    let write_err = |source| IoError::Save {
        stage: SaveStage::Write,
        path: dest.to_path_buf(),
        source,
    };

    let dir = match dest.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    let mut tmp = tempfile::Builder::new()
        .prefix(".procstore-")
        .suffix(".saveTMP")
        .tempfile_in(dir)
        .map_err(write_err)?;
    tmp.write_all(&bytes).map_err(write_err)?;
    tmp.as_file().sync_all().map_err(write_err)?;

    tmp.persist(dest).map_err(|e| IoError::Save {
        stage: SaveStage::Replace,
        path: dest.to_path_buf(),
        source: e.error,
    })?;

    debug!(path = %dest.display(), bytes = bytes.len(), "bitmap saved");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::{decode_bitmap, ContentError};

    fn solid(red: u8) -> Grid<Cell> {
        Grid::from_fn(3, 2, |_, _| Cell::from_argb(255, red, 0, 0)).unwrap()
    }

    #[test]
    fn save_writes_decodable_file() {
        let dir = tempfile::tempdir().unwrap();
        let dest = dir.path().join("one.bmp");
        save_bitmap(&solid(7), &dest).unwrap();
        assert_eq!(decode_bitmap(&std::fs::read(&dest).unwrap()).unwrap(), solid(7));
    }

    #[test]
    fn save_replaces_existing_file() {
        let dir = tempfile::tempdir().unwrap();
        let dest = dir.path().join("one.bmp");
        save_bitmap(&solid(1), &dest).unwrap();
        save_bitmap(&solid(2), &dest).unwrap();

        assert_eq!(decode_bitmap(&std::fs::read(&dest).unwrap()).unwrap(), solid(2));
        // No temporary files left behind.
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 1);
    }

    #[test]
    fn missing_directory_fails_at_write_stage() {
        let dir = tempfile::tempdir().unwrap();
        let dest = dir.path().join("absent").join("one.bmp");
        match save_bitmap(&solid(1), &dest) {
            Err(IoError::Save { stage, path, .. }) => {
                assert_eq!(stage, SaveStage::Write);
                assert_eq!(path, dest);
            }
            other => panic!("expected save error, got {other:?}"),
        }
    }

    #[test]
    fn translucent_content_is_not_written() {
        let dir = tempfile::tempdir().unwrap();
        let dest = dir.path().join("one.bmp");
        let grid = Grid::from_fn(1, 1, |_, _| Cell::from_argb(0, 1, 1, 1)).unwrap();

        assert!(matches!(
            save_bitmap(&grid, &dest),
            Err(IoError::InvalidContent {
                source: ContentError::Opacity { .. },
                ..
            })
        ));
        assert!(!dest.exists());
    }
}
