//! Bitmap file I/O for procstore.
//!
//! Records persist as single-frame bitmap files, one file per record. This
//! crate owns everything that touches those files:
//!
//! - [`codec`] -- bitmap bytes to and from a [`Grid`](procstore_types::Grid),
//!   enforcing the fixed opacity every pixel must carry
//! - [`RetryingFileReader`] -- opens files with bounded retry, so a file
//!   briefly locked by another process is still read
//! - [`save_bitmap`] -- write-to-temp then rename, so readers never observe a
//!   half-written file
//! - [`scan_images`] -- recursive, cancellable enumeration of image files
//!
//! # Design Rules
//!
//! 1. Files are opened for reading only and closed before any error returns.
//! 2. A save never overwrites the destination in place.
//! 3. All I/O errors carry the path involved and the underlying cause.

pub mod codec;
pub mod error;
pub mod reader;
pub mod scan;
pub mod writer;

pub use codec::{check_opacity, decode_bitmap, encode_bitmap, ContentError, REQUIRED_OPACITY};
pub use error::{IoError, IoResult, SaveStage};
pub use reader::RetryingFileReader;
pub use scan::{is_image_file, looks_like_directory, scan_images};
pub use writer::save_bitmap;
