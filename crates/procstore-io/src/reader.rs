use std::fs::File;
use std::io::Read;
use std::path::Path;
use std::thread;
use std::time::Duration;

use procstore_types::{Cell, Grid};
use tracing::{debug, warn};

use crate::codec::decode_bitmap;
use crate::error::{IoError, IoResult};

/// Default number of open attempts.
pub const DEFAULT_ATTEMPTS: u32 = 50;

/// Default pause between open attempts.
pub const DEFAULT_RETRY_DELAY: Duration = Duration::from_millis(100);

/// Reads record images, retrying the open while the file is unavailable.
///
/// Another process may briefly hold a file it is still writing. Opening is
/// retried up to `attempts` times with a fixed `delay` between tries; only
/// then is the last failure surfaced. Holds no shared state, so one reader
/// may serve any number of threads.
#[derive(Clone, Debug)]
pub struct RetryingFileReader {
    attempts: u32,
    delay: Duration,
}

impl RetryingFileReader {
    /// Create a reader. At least one attempt is always made.
    pub fn new(attempts: u32, delay: Duration) -> Self {
        Self {
            attempts: attempts.max(1),
            delay,
        }
    }

    pub fn attempts(&self) -> u32 {
        self.attempts
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }

    /// Open `path` for reading, retrying on failure.
    pub fn open(&self, path: &Path) -> IoResult<File> {
        let mut attempt = 1;
        loop {
            match File::open(path) {
                Ok(file) => return Ok(file),
                Err(source) if attempt >= self.attempts => {
                    warn!(path = %path.display(), attempts = attempt, error = %source, "giving up on unreadable file");
                    return Err(IoError::Unreadable {
                        path: path.to_path_buf(),
                        attempts: attempt,
                        source,
                    });
                }
                Err(e) => {
                    debug!(path = %path.display(), attempt, error = %e, "open failed; retrying");
                    thread::sleep(self.delay);
                    attempt += 1;
                }
            }
        }
    }

    /// Read and decode the image at `path`.
    ///
    /// The file is closed before decoding starts, so a content error never
    /// leaves it open.
    pub fn read_image(&self, path: &Path) -> IoResult<Grid<Cell>> {
        let bytes = {
            let mut file = self.open(path)?;
            let mut bytes = Vec::new();
            file.read_to_end(&mut bytes).map_err(|source| IoError::Read {
                path: path.to_path_buf(),
                source,
            })?;
            bytes
        };

        decode_bitmap(&bytes).map_err(|source| IoError::InvalidContent {
            path: path.to_path_buf(),
            source,
        })
    }
}

impl Default for RetryingFileReader {
    fn default() -> Self {
        Self::new(DEFAULT_ATTEMPTS, DEFAULT_RETRY_DELAY)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::{encode_bitmap, ContentError};
    use std::time::Instant;

    fn quick() -> RetryingFileReader {
        RetryingFileReader::new(3, Duration::from_millis(5))
    }

    #[test]
    fn defaults() {
        let r = RetryingFileReader::default();
        assert_eq!(r.attempts(), 50);
        assert_eq!(r.delay(), Duration::from_millis(100));
    }

    #[test]
    fn zero_attempts_still_tries_once() {
        assert_eq!(RetryingFileReader::new(0, Duration::ZERO).attempts(), 1);
    }

    #[test]
    fn reads_valid_bitmap() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("a.bmp");
        let grid = Grid::from_fn(2, 3, |x, y| Cell::from_argb(255, x as u8, y as u8, 9)).unwrap();
        std::fs::write(&path, encode_bitmap(&grid).unwrap()).unwrap();

        assert_eq!(quick().read_image(&path).unwrap(), grid);
    }

    #[test]
    fn missing_file_fails_after_all_attempts() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing.bmp");

        let started = Instant::now();
        match quick().read_image(&path) {
            Err(IoError::Unreadable { attempts, source, .. }) => {
                assert_eq!(attempts, 3);
                assert_eq!(source.kind(), std::io::ErrorKind::NotFound);
            }
            other => panic!("expected Unreadable, got {other:?}"),
        }
        // Two pauses between three attempts.
        assert!(started.elapsed() >= Duration::from_millis(10));
    }

    #[test]
    fn file_appearing_during_retries_is_read() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("late.bmp");
        let grid = Grid::from_fn(1, 1, |_, _| Cell::from_argb(255, 1, 2, 3)).unwrap();

        let writer = {
            let (path, grid) = (path.clone(), grid.clone());
            thread::spawn(move || {
                thread::sleep(Duration::from_millis(30));
                crate::writer::save_bitmap(&grid, &path).unwrap();
            })
        };

        let reader = RetryingFileReader::new(200, Duration::from_millis(10));
        let read = reader.read_image(&path).unwrap();
        writer.join().unwrap();
        assert_eq!(read, grid);
    }

    #[test]
    fn translucent_file_is_invalid_content() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ghost.bmp");
        let image = image::RgbaImage::from_fn(3, 2, |x, y| {
            let alpha = if (x, y) == (1, 1) { 7 } else { 255 };
            image::Rgba([10, 20, 30, alpha])
        });
        image.save_with_format(&path, image::ImageFormat::Bmp).unwrap();

        match quick().read_image(&path) {
            Err(IoError::InvalidContent {
                path: failed,
                source: ContentError::Opacity { x, y, found, .. },
            }) => {
                assert_eq!(failed, path);
                assert_eq!((x, y, found), (1, 1, 7));
            }
            other => panic!("expected InvalidContent, got {other:?}"),
        }
    }

    #[test]
    fn corrupt_file_is_invalid_content() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.bmp");
        std::fs::write(&path, b"BM but not really").unwrap();

        assert!(matches!(
            quick().read_image(&path),
            Err(IoError::InvalidContent {
                source: ContentError::Codec(_),
                ..
            })
        ));
    }
}
