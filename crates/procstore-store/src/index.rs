//! The two indices behind [`DualIndexStore`](crate::DualIndexStore).
//!
//! Not synchronized; the store wraps it in its one lock.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use indexmap::IndexMap;
use procstore_types::{ContentHash, NormalizedPath, Record};

use crate::error::{StoreError, StoreResult};

/// A record with the file path it was loaded from.
#[derive(Clone, Debug)]
pub(crate) struct PathEntry {
    pub record: Record,
    pub path: PathBuf,
    pub hash: ContentHash,
}

/// Path keys of every entry whose content hashes to one value.
///
/// Holds keys into the path index rather than the entries themselves, so an
/// entry has exactly one owner. Never empty while in the index.
#[derive(Clone, Debug, Default)]
struct HashBucket {
    entries: Vec<NormalizedPath>,
}

/// Path index and hash index over one set of entries.
///
/// Every mutation keeps the two in step: each path key appears in exactly
/// one bucket, the bucket of its entry's hash. Path order is insertion
/// order. `generation` changes on every mutation so readers outside the
/// lock can detect concurrent changes.
#[derive(Debug, Default)]
pub(crate) struct DualIndex {
    by_path: IndexMap<NormalizedPath, PathEntry>,
    by_hash: HashMap<ContentHash, HashBucket>,
    generation: u64,
}

impl DualIndex {
    pub fn len(&self) -> usize {
        self.by_path.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_path.is_empty()
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Add an entry under `key`. Fails without changing anything if the key
    /// is already present.
    pub fn insert(
        &mut self,
        key: NormalizedPath,
        path: &Path,
        record: Record,
        hash: ContentHash,
    ) -> StoreResult<()> {
        if self.by_path.contains_key(&key) {
            return Err(StoreError::DuplicatePath(key));
        }

        self.by_hash
            .entry(hash)
            .or_default()
            .entries
            .push(key.clone());
        self.by_path.insert(
            key,
            PathEntry {
                record,
                path: path.to_path_buf(),
                hash,
            },
        );
        self.generation += 1;
        Ok(())
    }

    /// Remove the entry under `key` from both indices.
    pub fn remove(&mut self, key: &NormalizedPath) -> Option<PathEntry> {
        let entry = self.by_path.shift_remove(key)?;

        if let Some(bucket) = self.by_hash.get_mut(&entry.hash) {
            if let Some(i) = bucket.entries.iter().position(|k| k == key) {
                bucket.entries.remove(i);
            }
            if bucket.entries.is_empty() {
                self.by_hash.remove(&entry.hash);
            }
        }
        self.generation += 1;
        Some(entry)
    }

    pub fn clear(&mut self) {
        self.by_path.clear();
        self.by_hash.clear();
        self.generation += 1;
    }

    pub fn get(&self, key: &NormalizedPath) -> Option<&PathEntry> {
        self.by_path.get(key)
    }

    pub fn contains(&self, key: &NormalizedPath) -> bool {
        self.by_path.contains_key(key)
    }

    pub fn get_index(&self, index: usize) -> Option<(&NormalizedPath, &PathEntry)> {
        self.by_path.get_index(index)
    }

    pub fn position(&self, key: &NormalizedPath) -> Option<usize> {
        self.by_path.get_index_of(key)
    }

    pub fn entries(&self) -> impl Iterator<Item = &PathEntry> {
        self.by_path.values()
    }

    /// Keys whose text starts with `prefix`, in index order.
    pub fn keys_with_prefix(&self, prefix: &str) -> Vec<NormalizedPath> {
        self.by_path
            .keys()
            .filter(|k| k.as_str().starts_with(prefix))
            .cloned()
            .collect()
    }

    /// Entries in the bucket for `hash`. Includes hash collisions.
    pub fn bucket(&self, hash: ContentHash) -> impl Iterator<Item = &PathEntry> {
        self.by_hash
            .get(&hash)
            .into_iter()
            .flat_map(|b| b.entries.iter())
            .filter_map(move |k| self.by_path.get(k))
    }

    /// Buckets holding more than one entry.
    pub fn shared_buckets(&self) -> impl Iterator<Item = Vec<&PathEntry>> {
        self.by_hash
            .values()
            .filter(|b| b.entries.len() > 1)
            .map(move |b| b.entries.iter().filter_map(|k| self.by_path.get(k)).collect())
    }

    /// Check that the two indices agree.
    ///
    /// Every bucket is non-empty, every bucket key is in the path index
    /// under that bucket's hash, and the bucket sizes add up to the number
    /// of paths.
    #[cfg(test)]
    pub fn is_consistent(&self) -> bool {
        let total: usize = self.by_hash.values().map(|b| b.entries.len()).sum();
        total == self.by_path.len()
            && self.by_hash.iter().all(|(hash, bucket)| {
                !bucket.entries.is_empty()
                    && bucket
                        .entries
                        .iter()
                        .all(|k| self.by_path.get(k).is_some_and(|e| e.hash == *hash))
            })
    }
}
