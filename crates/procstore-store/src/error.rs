use std::fmt;
use std::path::PathBuf;

use procstore_io::IoError;
use procstore_names::NameError;
use procstore_types::{ContentHash, NormalizedPath, TypeError};

/// Image axis named in dimension errors.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Axis {
    Width,
    Height,
}

impl fmt::Display for Axis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Width => write!(f, "width"),
            Self::Height => write!(f, "height"),
        }
    }
}

/// Errors from store operations.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// The path lies outside the store's working directory.
    #[error("{path:?} is outside the working directory {working_dir:?}")]
    OutsideWorkingDirectory { path: PathBuf, working_dir: PathBuf },

    /// The path does not carry the store's image extension.
    #[error("{path:?} is not a .{extension} file")]
    NotAnImage { path: PathBuf, extension: String },

    /// An entry already exists under this path key.
    #[error("duplicate path: {0}")]
    DuplicatePath(NormalizedPath),

    /// The supplied hash does not match the record content.
    #[error("hash mismatch for {path:?}: given {given}, computed {computed}")]
    HashMismatch {
        path: PathBuf,
        given: ContentHash,
        computed: ContentHash,
    },

    /// Image dimensions differ from the exact size the policy requires.
    #[error("{path:?} is {actual_width}x{actual_height}, expected {expected_width}x{expected_height}")]
    DimensionMismatch {
        path: PathBuf,
        expected_width: u32,
        expected_height: u32,
        actual_width: u32,
        actual_height: u32,
    },

    /// One image dimension lies outside the policy's inclusive range.
    #[error("{path:?}: {axis} {value} outside [{min}, {max}]")]
    DimensionOutOfRange {
        path: PathBuf,
        axis: Axis,
        value: u32,
        min: u32,
        max: u32,
    },

    /// Reading, writing or scanning failed.
    #[error(transparent)]
    Io(#[from] IoError),

    /// Name allocation failed.
    #[error(transparent)]
    Name(#[from] NameError),

    /// A value failed validation.
    #[error(transparent)]
    Type(#[from] TypeError),

    /// The configuration file could not be parsed.
    #[error("invalid configuration: {0}")]
    Config(#[from] toml::de::Error),

    /// More than one item of a batch failed.
    #[error("{} errors while loading records", .0.len())]
    Aggregate(Vec<StoreError>),

    /// The store was mutated while an enumeration was in progress.
    #[error("store changed during enumeration")]
    CollectionChanged,
}

impl StoreError {
    /// Number of underlying failures: the aggregate size, or 1.
    pub fn cause_count(&self) -> usize {
        match self {
            Self::Aggregate(errors) => errors.len(),
            _ => 1,
        }
    }

    /// Build the error for a batch: `None` when `errors` is empty, the sole
    /// error when there is one, an aggregate otherwise.
    pub(crate) fn collect(mut errors: Vec<StoreError>) -> Option<StoreError> {
        match errors.len() {
            0 => None,
            1 => errors.pop(),
            _ => Some(Self::Aggregate(errors)),
        }
    }
}

impl From<std::io::Error> for StoreError {
    fn from(e: std::io::Error) -> Self {
        Self::Io(IoError::Io(e))
    }
}

/// Result alias for store operations.
pub type StoreResult<T> = Result<T, StoreError>;
