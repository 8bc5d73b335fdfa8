//! Content checksum for procstore records.
//!
//! The hash index of the store groups records by [`ContentHasher::hash`].
//! The checksum is a table-driven CRC over the little-endian bytes of every
//! cell in row-major order, using the Dallas/Maxim polynomial `0x31` and
//! seed `0xFF`. Only the content is hashed; the display name never
//! participates.

pub mod hasher;

pub use hasher::ContentHasher;
