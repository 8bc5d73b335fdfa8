//! Foundation types for procstore.
//!
//! This crate provides the value types shared by every other procstore crate.
//! A record is an immutable grid of cells (decoded from an image) paired with
//! a display name; records are indexed by the normalized path of the file
//! they were read from and by the hash of their content.
//!
//! # Key Types
//!
//! - [`Cell`] -- One packed ARGB pixel value
//! - [`Grid`] -- Row-major rectangle of cells
//! - [`Record`] -- Immutable content plus display name
//! - [`NormalizedPath`] -- Case-folded path key for case-insensitive lookup
//! - [`ContentHash`] -- Checksum of a record's content, ignoring its name

pub mod error;
pub mod grid;
pub mod hash;
pub mod path;
pub mod record;

pub use error::TypeError;
pub use grid::{Cell, Grid};
pub use hash::ContentHash;
pub use path::NormalizedPath;
pub use record::Record;
