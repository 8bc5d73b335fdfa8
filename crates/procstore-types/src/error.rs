use thiserror::Error;

/// Errors produced by type construction.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TypeError {
    #[error("grid dimensions must be non-zero, got {width}x{height}")]
    EmptyGrid { width: u32, height: u32 },

    #[error("grid of {width}x{height} needs {expected} cells, got {actual}")]
    CellCount {
        width: u32,
        height: u32,
        expected: usize,
        actual: usize,
    },

    #[error("record name must not be empty or whitespace")]
    EmptyName,

    #[error("path must not be empty")]
    EmptyPath,
}
