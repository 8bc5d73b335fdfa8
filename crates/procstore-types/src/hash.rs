use std::fmt;

use serde::{Deserialize, Serialize};

/// Checksum of a record's content.
///
/// Equal content always produces an equal `ContentHash`; different content
/// may collide, so a hash only narrows a lookup to a bucket.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ContentHash(i32);

impl ContentHash {
    pub const fn new(value: i32) -> Self {
        Self(value)
    }

    pub const fn value(self) -> i32 {
        self.0
    }
}

impl fmt::Debug for ContentHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ContentHash({self})")
    }
}

impl fmt::Display for ContentHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:08x}", self.0 as u32)
    }
}

impl From<ContentHash> for i32 {
    fn from(hash: ContentHash) -> Self {
        hash.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_is_padded_hex() {
        assert_eq!(ContentHash::new(255).to_string(), "000000ff");
        assert_eq!(ContentHash::new(-1).to_string(), "ffffffff");
    }

    #[test]
    fn debug_wraps_display() {
        assert_eq!(format!("{:?}", ContentHash::new(16)), "ContentHash(00000010)");
    }
}
