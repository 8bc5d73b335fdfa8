use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};

use procstore_hash::ContentHasher;
use procstore_io::{is_image_file, looks_like_directory, scan_images, RetryingFileReader};
use procstore_names::{parse_name, NameAllocator};
use procstore_types::{Cell, ContentHash, Grid, NormalizedPath, Record};
use tracing::{debug, info, warn};

use crate::cancel::CancellationFlag;
use crate::config::StorageConfig;
use crate::error::{StoreError, StoreResult};
use crate::index::{DualIndex, PathEntry};
use crate::policy::{file_stem, SelectionAction, StorageKind, StoragePolicy};

/// The selected path: the key it is looked up by and the path as given.
#[derive(Clone, Debug)]
pub(crate) struct Selection {
    pub key: NormalizedPath,
    pub path: PathBuf,
}

/// Everything guarded by the store lock.
#[derive(Debug, Default)]
pub(crate) struct StoreState {
    pub index: DualIndex,
    pub selection: Option<Selection>,
    /// Memoized position of `selection` in the path index.
    pub cached_index: Option<usize>,
}

impl StoreState {
    /// Remove one entry, dropping the selection if it pointed there.
    fn remove_key(&mut self, key: &NormalizedPath) -> Option<PathEntry> {
        let entry = self.index.remove(key)?;
        self.cached_index = None;
        if self.selection.as_ref().is_some_and(|s| s.key == *key) {
            self.selection = None;
        }
        Some(entry)
    }

    pub fn select_path(&mut self, key: NormalizedPath, path: PathBuf, index: Option<usize>) {
        self.selection = Some(Selection { key, path });
        self.cached_index = index;
    }

    fn selected_index(&mut self) -> Option<usize> {
        if self.cached_index.is_none() {
            let key = &self.selection.as_ref()?.key;
            self.cached_index = self.index.position(key);
        }
        self.cached_index
    }

    fn select_at(&mut self, index: usize) -> Option<Selected> {
        let count = self.index.len();
        let (key, entry) = self.index.get_index(index)?;
        let key = key.clone();
        let selected = Selected {
            record: entry.record.clone(),
            path: entry.path.clone(),
            index,
            count,
        };
        self.select_path(key, selected.path.clone(), Some(index));
        Some(selected)
    }
}

/// A record resolved by a selection call.
#[derive(Clone, Debug, PartialEq)]
pub struct Selected {
    pub record: Record,
    pub path: PathBuf,
    /// Position of the record in the store.
    pub index: usize,
    /// Number of records in the store at the time of selection.
    pub count: usize,
}

/// Thread-safe store of records indexed by path and by content hash.
///
/// Both indices and the selection live behind one mutex, held for the full
/// duration of every operation that touches them, so no caller ever sees
/// one index updated without the other. File decoding happens outside the
/// lock; only the index update is serialized.
///
/// Only files under the policy's working directory are stored. Records read
/// from elsewhere are decoded and returned but not indexed.
pub struct DualIndexStore<P> {
    policy: P,
    config: StorageConfig,
    reader: RetryingFileReader,
    cancel: CancellationFlag,
    working_dir: NormalizedPath,
    state: Mutex<StoreState>,
}

impl<P: StoragePolicy> DualIndexStore<P> {
    /// Create a store that honours the process-wide cancellation flag.
    pub fn new(policy: P, config: StorageConfig) -> StoreResult<Self> {
        Self::with_cancellation(policy, config, CancellationFlag::global().clone())
    }

    /// Create a store polling `cancel` during long operations.
    pub fn with_cancellation(
        policy: P,
        config: StorageConfig,
        cancel: CancellationFlag,
    ) -> StoreResult<Self> {
        let working_dir = NormalizedPath::new(policy.working_directory())?;
        let reader = config.reader();
        debug!(
            kind = ?policy.kind(),
            working_dir = %working_dir,
            extension = %config.extension,
            "store created"
        );
        Ok(Self {
            policy,
            config,
            reader,
            cancel,
            working_dir,
            state: Mutex::new(StoreState::default()),
        })
    }

    pub(crate) fn lock(&self) -> MutexGuard<'_, StoreState> {
        self.state.lock().expect("lock poisoned")
    }

    pub fn policy(&self) -> &P {
        &self.policy
    }

    pub fn kind(&self) -> StorageKind {
        self.policy.kind()
    }

    pub fn config(&self) -> &StorageConfig {
        &self.config
    }

    pub fn cancellation(&self) -> &CancellationFlag {
        &self.cancel
    }

    pub fn working_directory(&self) -> &Path {
        self.policy.working_directory()
    }

    // -----------------------------------------------------------------------
    // Paths
    // -----------------------------------------------------------------------

    /// Returns `true` if `path` is the working directory or lies inside it.
    /// Case and trailing separators are ignored.
    pub fn is_working_directory(&self, path: &Path) -> bool {
        NormalizedPath::new(path).is_ok_and(|p| p.is_within(&self.working_dir))
    }

    /// Returns `true` if `path` denotes the working directory itself.
    pub fn is_same_directory(&self, path: &Path) -> bool {
        NormalizedPath::new(path).is_ok_and(|p| p.same_directory(&self.working_dir))
    }

    /// Create the working directory and its parents if missing.
    pub fn create_working_directory(&self) -> StoreResult<()> {
        std::fs::create_dir_all(self.working_directory())?;
        Ok(())
    }

    /// Returns `true` if `path` has the store's image extension.
    pub fn is_image_file(&self, path: &Path) -> bool {
        is_image_file(path, &self.config.extension)
    }

    fn check_working_directory(&self, path: &Path) -> StoreResult<()> {
        if self.is_working_directory(path) {
            return Ok(());
        }
        Err(StoreError::OutsideWorkingDirectory {
            path: path.to_path_buf(),
            working_dir: self.working_directory().to_path_buf(),
        })
    }

    // -----------------------------------------------------------------------
    // Adding
    // -----------------------------------------------------------------------

    /// Load whatever `path` names: a single image file, or every image file
    /// under a directory.
    ///
    /// Paths that are neither yield nothing.
    pub fn load(&self, path: &Path) -> StoreResult<Vec<Record>> {
        if self.is_image_file(path) {
            return Ok(self.add(path)?.into_iter().collect());
        }
        if looks_like_directory(path) {
            return self.add_batch(path);
        }
        Ok(Vec::new())
    }

    /// Decode the image at `path` with the policy and store it.
    pub fn add(&self, path: &Path) -> StoreResult<Option<Record>> {
        if !self.is_image_file(path) {
            return Err(StoreError::NotAnImage {
                path: path.to_path_buf(),
                extension: self.config.extension.clone(),
            });
        }
        self.add_with(path, |p| self.policy.decode(p, &self.reader))
    }

    /// Decode `path` with `decode` and store the record.
    ///
    /// An existing entry at the same path is replaced. If decoding fails,
    /// any entry already stored for `path` is evicted before the error is
    /// returned. Returns `Ok(None)` if long operations were cancelled.
    pub fn add_with<F>(&self, path: &Path, decode: F) -> StoreResult<Option<Record>>
    where
        F: FnOnce(&Path) -> StoreResult<Record>,
    {
        let stored = self.is_working_directory(path);
        self.add_one(path, stored, decode)
    }

    fn add_one<F>(&self, path: &Path, stored: bool, decode: F) -> StoreResult<Option<Record>>
    where
        F: FnOnce(&Path) -> StoreResult<Record>,
    {
        let key = NormalizedPath::new(path)?;

        let record = match decode(path) {
            Ok(record) => record,
            Err(e) => {
                if stored && self.lock().remove_key(&key).is_some() {
                    info!(path = %path.display(), error = %e, "evicted entry that no longer decodes");
                }
                if !self.cancel.is_allowed() {
                    return Ok(None);
                }
                return Err(e);
            }
        };

        if !self.cancel.is_allowed() {
            return Ok(None);
        }
        if !stored {
            return Ok(Some(record));
        }

        let hash = ContentHasher::hash_record(&record);
        {
            let mut state = self.lock();
            self.replace_locked(&mut state, key, path, record.clone(), hash)?;
        }

        Ok(self.cancel.is_allowed().then_some(record))
    }

    /// Decode every image under `root` with the policy.
    ///
    /// See [`add_batch_with`](Self::add_batch_with).
    pub fn add_batch(&self, root: &Path) -> StoreResult<Vec<Record>> {
        self.add_batch_with(root, |p| self.policy.decode(p, &self.reader))
    }

    /// Decode every image under `root` with `decode`.
    ///
    /// Records are stored only when `root` lies in the working directory;
    /// otherwise they are just returned. A failing file does not stop the
    /// batch. After the walk, one failure is returned as is and several as
    /// [`StoreError::Aggregate`]; records decoded before and after a failure
    /// stay stored either way. A cancelled batch returns an empty list and
    /// no error.
    pub fn add_batch_with<F>(&self, root: &Path, decode: F) -> StoreResult<Vec<Record>>
    where
        F: Fn(&Path) -> StoreResult<Record>,
    {
        let stored = self.is_working_directory(root);
        let mut records = Vec::new();
        let mut errors = Vec::new();

        for found in scan_images(root, &self.config.extension, || self.cancel.is_allowed()) {
            let outcome = found
                .map_err(StoreError::from)
                .and_then(|path| self.add_one(&path, stored, &decode));
            match outcome {
                Ok(Some(record)) => records.push(record),
                Ok(None) => {}
                Err(e) => {
                    warn!(error = %e, "batch item failed");
                    errors.push(e);
                }
            }
        }

        if !self.cancel.is_allowed() {
            info!(root = %root.display(), "batch add cancelled");
            return Ok(Vec::new());
        }

        info!(
            root = %root.display(),
            loaded = records.len(),
            failed = errors.len(),
            stored,
            "batch add finished"
        );
        match StoreError::collect(errors) {
            Some(e) => Err(e),
            None => Ok(records),
        }
    }

    // -----------------------------------------------------------------------
    // Replacing and removing
    // -----------------------------------------------------------------------

    /// Store `record` at `path`, replacing any entry already there.
    ///
    /// `hash` must be the content hash of `record`.
    pub fn replace(&self, hash: ContentHash, path: &Path, record: Record) -> StoreResult<()> {
        self.check_working_directory(path)?;
        let computed = ContentHasher::hash_record(&record);
        if computed != hash {
            return Err(StoreError::HashMismatch {
                path: path.to_path_buf(),
                given: hash,
                computed,
            });
        }
        let key = NormalizedPath::new(path)?;
        let mut state = self.lock();
        self.replace_locked(&mut state, key, path, record, hash)
    }

    fn replace_locked(
        &self,
        state: &mut StoreState,
        key: NormalizedPath,
        path: &Path,
        record: Record,
        hash: ContentHash,
    ) -> StoreResult<()> {
        let replaced = state.remove_key(&key).is_some();
        if !self.cancel.is_allowed() {
            return Ok(());
        }

        state.index.insert(key.clone(), path, record, hash)?;
        state.cached_index = None;
        debug!(path = %path.display(), hash = %hash, replaced, "entry stored");

        if self.policy.on_replace(replaced) == SelectionAction::Select {
            state.select_path(key, path.to_path_buf(), None);
        }
        Ok(())
    }

    /// Remove the entry at `path`, or every entry under it if `path` looks
    /// like a directory.
    ///
    /// Returns `true` if anything was removed. Paths outside the working
    /// directory are ignored. A cancelled directory removal returns `false`
    /// and keeps whatever it already removed.
    pub fn remove(&self, path: &Path) -> bool {
        if !self.is_working_directory(path) {
            return false;
        }
        let Ok(key) = NormalizedPath::new(path) else {
            return false;
        };

        let mut state = self.lock();
        if !looks_like_directory(path) {
            let removed = state.remove_key(&key).is_some();
            if removed {
                debug!(path = %path.display(), "entry removed");
            }
            return removed;
        }

        if !self.cancel.is_allowed() {
            return false;
        }
        let doomed = state.index.keys_with_prefix(&key.with_trailing_separator());

        let mut removed = 0usize;
        for k in &doomed {
            if !self.cancel.is_allowed() {
                info!(path = %path.display(), removed, "directory removal cancelled");
                return false;
            }
            if state.remove_key(k).is_some() {
                removed += 1;
            }
        }
        debug!(path = %path.display(), removed, "directory removed");
        removed > 0
    }

    /// Remove every entry and reset the selection.
    pub fn clear(&self) {
        let mut state = self.lock();
        state.index.clear();
        state.selection = None;
        state.cached_index = None;
        debug!("store cleared");
    }

    // -----------------------------------------------------------------------
    // Lookup
    // -----------------------------------------------------------------------

    pub fn get(&self, path: &Path) -> Option<Record> {
        let key = NormalizedPath::new(path).ok()?;
        self.lock().index.get(&key).map(|e| e.record.clone())
    }

    /// The record at position `index`, with its path.
    pub fn get_index(&self, index: usize) -> Option<(Record, PathBuf)> {
        self.lock()
            .index
            .get_index(index)
            .map(|(_, e)| (e.record.clone(), e.path.clone()))
    }

    pub fn contains(&self, path: &Path) -> bool {
        NormalizedPath::new(path).is_ok_and(|key| self.lock().index.contains(&key))
    }

    pub fn count(&self) -> usize {
        self.lock().index.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().index.is_empty()
    }

    /// Every stored record whose content equals `content`, with its path.
    pub fn find_by_content(&self, content: &Grid<Cell>) -> Vec<(PathBuf, Record)> {
        let hash = ContentHasher::hash(content);
        self.lock()
            .index
            .bucket(hash)
            .filter(|e| e.record.content() == content)
            .map(|e| (e.path.clone(), e.record.clone()))
            .collect()
    }

    /// Groups of two or more stored records with equal content.
    pub fn duplicate_groups(&self) -> Vec<Vec<(PathBuf, Record)>> {
        let state = self.lock();
        let mut groups = Vec::new();
        for bucket in state.index.shared_buckets() {
            // A bucket may mix contents whose hashes collide.
            let mut split: Vec<Vec<&PathEntry>> = Vec::new();
            for entry in bucket {
                match split.iter_mut().find(|g| g[0].record.same_content(&entry.record)) {
                    Some(group) => group.push(entry),
                    None => split.push(vec![entry]),
                }
            }
            groups.extend(split.into_iter().filter(|g| g.len() > 1).map(|g| {
                g.into_iter()
                    .map(|e| (e.path.clone(), e.record.clone()))
                    .collect()
            }));
        }
        groups
    }

    // -----------------------------------------------------------------------
    // Enumeration
    // -----------------------------------------------------------------------

    /// Iterate over the records in insertion order.
    ///
    /// The lock is taken per step, not for the whole walk. If the store
    /// changes between steps the iterator yields
    /// [`StoreError::CollectionChanged`] once and then ends. Use
    /// [`snapshot`](Self::snapshot) for a stable copy.
    pub fn elements(&self) -> Elements<'_, P> {
        let generation = self.lock().index.generation();
        Elements {
            store: self,
            generation,
            position: 0,
            done: false,
        }
    }

    /// Copy every `(path, record)` pair under the lock.
    pub fn snapshot(&self) -> Vec<(PathBuf, Record)> {
        self.lock()
            .index
            .entries()
            .map(|e| (e.path.clone(), e.record.clone()))
            .collect()
    }

    /// The records renamed so that no two share a name.
    ///
    /// Names come from the file names of the stored paths, de-masked and
    /// then allocated in index order, so `a/x.bmp` and `b/x.bmp` come out as
    /// `x` and `x!0`. The store is not modified.
    pub fn unique_elements(&self) -> StoreResult<Vec<Record>> {
        let state = self.lock();
        let mut names = NameAllocator::new();
        let records = state
            .index
            .entries()
            .map(|e| -> StoreResult<Record> {
                let hint = parse_name(&file_stem(&e.path).to_lowercase())?;
                let name = names.allocate(&hint)?;
                Ok(e.record.renamed(name)?)
            })
            .collect();
        records
    }

    // -----------------------------------------------------------------------
    // Selection
    // -----------------------------------------------------------------------

    /// Select the record at `index`, clamped into range. Returns `None` only
    /// when the store is empty.
    pub fn select(&self, index: isize) -> Option<Selected> {
        let mut state = self.lock();
        let last = state.index.len().checked_sub(1)?;
        let index = usize::try_from(index).unwrap_or(0).min(last);
        state.select_at(index)
    }

    pub fn select_first(&self) -> Option<Selected> {
        self.select(0)
    }

    pub fn select_last(&self) -> Option<Selected> {
        self.select(isize::MAX)
    }

    /// Re-resolve the current selection. `None` if nothing is selected or
    /// the selected path is not indexed.
    pub fn select_current(&self) -> Option<Selected> {
        let mut state = self.lock();
        let index = state.selected_index()?;
        state.select_at(index)
    }

    pub fn selected_path(&self) -> Option<PathBuf> {
        self.lock().selection.as_ref().map(|s| s.path.clone())
    }

    /// Position of the selected path in the store, if it is indexed.
    pub fn selected_index(&self) -> Option<usize> {
        self.lock().selected_index()
    }

    /// Whether a selection is in effect.
    pub fn is_selected(&self) -> bool {
        let mut state = self.lock();
        if state.selection.is_none() {
            return false;
        }
        !self.policy.selection_requires_entry() || state.selected_index().is_some()
    }

    /// Whether the selected path exists on disk. `false` with no selection.
    pub fn selected_path_exists(&self) -> bool {
        self.selected_path().is_some_and(|p| p.is_file())
    }

    #[cfg(test)]
    pub(crate) fn is_consistent(&self) -> bool {
        self.lock().index.is_consistent()
    }
}

impl<P: StoragePolicy> std::fmt::Debug for DualIndexStore<P> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DualIndexStore")
            .field("kind", &self.policy.kind())
            .field("working_dir", &self.working_dir)
            .field("count", &self.count())
            .finish()
    }
}

/// Weakly consistent iterator returned by [`DualIndexStore::elements`].
pub struct Elements<'a, P> {
    store: &'a DualIndexStore<P>,
    generation: u64,
    position: usize,
    done: bool,
}

impl<P: StoragePolicy> Iterator for Elements<'_, P> {
    type Item = StoreResult<Record>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        let state = self.store.lock();
        if state.index.generation() != self.generation {
            self.done = true;
            return Some(Err(StoreError::CollectionChanged));
        }
        match state.index.get_index(self.position) {
            Some((_, entry)) => {
                self.position += 1;
                Some(Ok(entry.record.clone()))
            }
            None => {
                self.done = true;
                None
            }
        }
    }
}
