use std::fmt;
use std::path::Path;

use serde::Serialize;

use crate::error::TypeError;

/// A path key for case-insensitive comparison.
///
/// Holds the original path text lower-cased. Never empty and never mutated
/// after construction; two paths that differ only in letter case map to the
/// same key.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct NormalizedPath(String);

impl NormalizedPath {
    /// Normalize a filesystem path.
    pub fn new(path: impl AsRef<Path>) -> Result<Self, TypeError> {
        let text = path.as_ref().to_string_lossy();
        if text.is_empty() {
            return Err(TypeError::EmptyPath);
        }
        Ok(Self(text.to_lowercase()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The key text with exactly one trailing directory separator.
    pub fn with_trailing_separator(&self) -> String {
        if self.0.ends_with(is_separator) {
            self.0.clone()
        } else {
            format!("{}{}", self.0, std::path::MAIN_SEPARATOR)
        }
    }

    /// Returns `true` if this path lies inside `dir` (or is `dir` itself).
    ///
    /// Both sides are compared with a trailing separator so `a/bc` is never
    /// considered inside `a/b`.
    pub fn is_within(&self, dir: &NormalizedPath) -> bool {
        self.with_trailing_separator()
            .starts_with(&dir.with_trailing_separator())
    }

    /// Returns `true` if both denote the same directory, ignoring a trailing
    /// separator.
    pub fn same_directory(&self, other: &NormalizedPath) -> bool {
        self.with_trailing_separator() == other.with_trailing_separator()
    }
}

fn is_separator(c: char) -> bool {
    c == '/' || c == '\\'
}

impl fmt::Debug for NormalizedPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "NormalizedPath({:?})", self.0)
    }
}

impl fmt::Display for NormalizedPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for NormalizedPath {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
