//! Error types for name handling.

use thiserror::Error;

/// Errors that can occur while parsing or allocating names.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum NameError {
    /// The name to parse was empty.
    #[error("name must not be empty")]
    Empty,

    /// Every numbered variant of the base name is already taken.
    #[error("no free name left for {base:?}")]
    Exhausted { base: String },
}

/// Convenience alias for name results.
pub type NameResult<T> = Result<T, NameError>;
