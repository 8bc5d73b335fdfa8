use std::fmt;
use std::io;
use std::path::PathBuf;

use crate::codec::ContentError;

/// The step of a save that failed.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SaveStage {
    /// Creating or filling the temporary file.
    Write,
    /// Moving the temporary file over the destination.
    Replace,
}

impl fmt::Display for SaveStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Write => write!(f, "write"),
            Self::Replace => write!(f, "replace"),
        }
    }
}

/// Errors from bitmap file operations.
#[derive(Debug, thiserror::Error)]
pub enum IoError {
    /// The file could not be opened, even after retrying.
    #[error("cannot open {path:?} after {attempts} attempts")]
    Unreadable {
        path: PathBuf,
        attempts: u32,
        #[source]
        source: io::Error,
    },

    /// The file was opened but reading it failed.
    #[error("failed to read {path:?}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// The bytes are not a valid record image.
    #[error("invalid content in {path:?}")]
    InvalidContent {
        path: PathBuf,
        #[source]
        source: ContentError,
    },

    /// A save failed at the named stage.
    #[error("failed to save {path:?} ({stage} stage)")]
    Save {
        stage: SaveStage,
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// Directory traversal failed.
    #[error("failed to scan {path:?}")]
    Scan {
        path: PathBuf,
        #[source]
        source: walkdir::Error,
    },

    /// Other I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

/// Result alias for bitmap I/O.
pub type IoResult<T> = Result<T, IoError>;
