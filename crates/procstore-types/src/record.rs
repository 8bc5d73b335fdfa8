use std::sync::Arc;

use crate::error::TypeError;
use crate::grid::{Cell, Grid};

/// Decoded content paired with a display name.
///
/// Records are immutable: renaming produces a new record sharing the same
/// content. Identity for hashing purposes is the content alone; two records
/// with equal content and different names are distinct entries.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Record {
    content: Arc<Grid<Cell>>,
    name: String,
}

impl Record {
    /// Create a record. The name must contain a non-whitespace character.
    pub fn new(content: Grid<Cell>, name: impl Into<String>) -> Result<Self, TypeError> {
        Self::from_shared(Arc::new(content), name)
    }

    fn from_shared(content: Arc<Grid<Cell>>, name: impl Into<String>) -> Result<Self, TypeError> {
        let name = name.into();
        if name.trim().is_empty() {
            return Err(TypeError::EmptyName);
        }
        Ok(Self { content, name })
    }

    /// A copy of this record under a different name.
    pub fn renamed(&self, name: impl Into<String>) -> Result<Self, TypeError> {
        Self::from_shared(Arc::clone(&self.content), name)
    }

    pub fn content(&self) -> &Grid<Cell> {
        &self.content
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn width(&self) -> u32 {
        self.content.width()
    }

    pub fn height(&self) -> u32 {
        self.content.height()
    }

    /// Returns `true` if both records carry equal content, whatever their names.
    pub fn same_content(&self, other: &Record) -> bool {
        Arc::ptr_eq(&self.content, &other.content) || self.content == other.content
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn grid(seed: i32) -> Grid<Cell> {
        Grid::from_fn(2, 2, |x, y| Cell::new(seed + (x + 2 * y) as i32)).unwrap()
    }

    #[test]
    fn blank_name_is_rejected() {
        assert_eq!(Record::new(grid(0), "  "), Err(TypeError::EmptyName));
        assert_eq!(Record::new(grid(0), ""), Err(TypeError::EmptyName));
    }

    #[test]
    fn renamed_shares_content() {
        let a = Record::new(grid(1), "a").unwrap();
        let b = a.renamed("b").unwrap();
        assert_eq!(b.name(), "b");
        assert!(a.same_content(&b));
        assert_ne!(a, b);
    }

    #[test]
    fn same_content_compares_values() {
        let a = Record::new(grid(1), "a").unwrap();
        let b = Record::new(grid(1), "b").unwrap();
        let c = Record::new(grid(2), "a").unwrap();
        assert!(a.same_content(&b));
        assert!(!a.same_content(&c));
    }

    #[test]
    fn dimensions_come_from_content() {
        let r = Record::new(grid(0), "r").unwrap();
        assert_eq!((r.width(), r.height()), (2, 2));
    }
}
