//! Thread-safe, dual-indexed record store for procstore.
//!
//! A [`DualIndexStore`] holds records decoded from image files under one
//! working directory. Every record is reachable two ways: by the
//! case-insensitive path of its file, and by the hash of its content. Many
//! paths may share one content hash; a path maps to exactly one record.
//!
//! # Components
//!
//! - [`DualIndexStore`] -- the two indices and the selection under one lock
//! - [`StoragePolicy`] -- working directory, decoding and selection rules,
//!   implemented by [`SearchPatternPolicy`] and [`RecognizeTargetPolicy`]
//! - [`CancellationFlag`] -- cooperative abort for bulk scans and removals
//! - persistence -- [`DualIndexStore::save`], [`DualIndexStore::save_batch`]
//!   and [`DualIndexStore::unique_path`]
//! - [`ProcstoreConfig`] -- TOML-loadable settings
//!
//! # Design Rules
//!
//! 1. The path index and the hash index change together or not at all.
//! 2. A hash bucket is never empty; it is dropped with its last entry.
//! 3. Inserting an existing path fails and leaves the store unchanged.
//! 4. Cancellation is not an error: it ends long operations early, leaving
//!    the store valid but possibly incomplete.
//! 5. A file that stops decoding is evicted rather than kept stale.

pub mod cancel;
pub mod config;
pub mod error;
mod index;
pub mod persist;
pub mod policy;
pub mod store;

pub use cancel::CancellationFlag;
pub use config::{ProcstoreConfig, RecognizeTargetConfig, SearchPatternConfig, StorageConfig};
pub use error::{Axis, StoreError, StoreResult};
pub use persist::sanitize_folder_name;
pub use policy::{
    RecognizeTargetPolicy, SearchPatternPolicy, SelectionAction, StorageKind, StoragePolicy,
};
pub use store::{DualIndexStore, Elements, Selected};
