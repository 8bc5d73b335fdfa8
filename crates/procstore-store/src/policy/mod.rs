//! Storage policies: what a store accepts and how it reacts to reloads.
//!
//! A [`DualIndexStore`](crate::DualIndexStore) owns one policy. The policy
//! fixes the working directory, decodes and validates files into records,
//! and decides whether reloading an existing entry moves the selection.

mod recognize;
mod search;

use std::path::Path;

use procstore_io::RetryingFileReader;
use procstore_types::Record;
use serde::{Deserialize, Serialize};

use crate::error::StoreResult;

pub use recognize::RecognizeTargetPolicy;
pub use search::SearchPatternPolicy;

/// Which kind of records a store holds.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StorageKind {
    /// Fixed-size patterns to search for.
    SearchPattern,
    /// Variable-size images to recognize patterns in.
    RecognizeTarget,
}

/// What a store does with its selection after replacing an entry.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SelectionAction {
    /// Leave the selection as it was.
    Keep,
    /// Select the path that was just inserted.
    Select,
}

/// The pluggable half of a store.
pub trait StoragePolicy: Send + Sync {
    fn kind(&self) -> StorageKind;

    /// Root directory of the store. Only files under it are indexed.
    fn working_directory(&self) -> &Path;

    /// Read and validate the image at `path` and build its record.
    fn decode(&self, path: &Path, reader: &RetryingFileReader) -> StoreResult<Record>;

    /// Selection rule applied after a replace. `replaced` is `true` when an
    /// entry already existed at the incoming path.
    fn on_replace(&self, replaced: bool) -> SelectionAction {
        let _ = replaced;
        SelectionAction::Keep
    }

    /// Whether a selection only counts while its path is indexed.
    fn selection_requires_entry(&self) -> bool {
        false
    }
}

/// The file name of `path` without its extension.
pub(crate) fn file_stem(path: &Path) -> String {
    path.file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default()
}
