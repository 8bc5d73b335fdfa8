//! Saving records as bitmap files under the working directory.

use std::fs;
use std::io;
use std::path::{Component, Path, PathBuf};

use procstore_io::{is_image_file, save_bitmap};
use procstore_names::{parse_name, NameAllocator, NameHint};
use procstore_types::{NormalizedPath, Record};
use tracing::info;

use crate::error::{StoreError, StoreResult};
use crate::policy::{file_stem, StoragePolicy};
use crate::store::{DualIndexStore, StoreState};

/// Characters replaced by `_` in folder names. Separators are included so a
/// folder name is always a single path component.
const INVALID_FOLDER_CHARS: &[char] = &['<', '>', ':', '"', '|', '?', '*', '/', '\\'];

/// Replace characters that are not allowed in file names with `_`.
///
/// The result is one normal path component: empty names become `_`, and
/// `.` and `..` have their dots replaced.
pub fn sanitize_folder_name(name: &str) -> String {
    if name.is_empty() {
        return "_".to_owned();
    }
    if name == "." || name == ".." {
        return "_".repeat(name.len());
    }
    name.chars()
        .map(|c| {
            if c.is_control() || INVALID_FOLDER_CHARS.contains(&c) {
                '_'
            } else {
                c
            }
        })
        .collect()
}

/// Whether `folder` is `dir` plus exactly one normal component.
fn is_single_component(folder: &Path, dir: &Path) -> bool {
    let mut rest = match folder.strip_prefix(dir) {
        Ok(rest) => rest.components(),
        Err(_) => return false,
    };
    matches!(
        (rest.next(), rest.next()),
        (Some(Component::Normal(_)), None)
    )
}

impl<P: StoragePolicy> DualIndexStore<P> {
    /// A free path in the working directory for a record named `tag`.
    ///
    /// The tag is de-masked first, so a numbered tag probes from its own
    /// number: `x!5` yields `x!5` if free and then `x!6`, never `x!5!0`.
    /// Names already used by indexed files and by image files present in
    /// the working directory are avoided. Nothing is reserved: two calls
    /// without a save in between return the same path.
    pub fn unique_path(&self, tag: &str) -> StoreResult<PathBuf> {
        let state = self.lock();
        let dir = self.working_directory();
        let mut names = self.names_in(&state, dir)?;
        let allocation = names.allocate_path(&parse_name(tag)?, dir, &self.config().extension)?;
        Ok(allocation.path)
    }

    /// Save `record` under a unique name in the working directory and
    /// select the new path.
    ///
    /// The working directory is created if missing. The file is not indexed
    /// here; adding it is up to the caller. Returns the saved path.
    pub fn save(&self, record: &Record) -> StoreResult<PathBuf> {
        let mut state = self.lock();
        self.create_working_directory()?;

        let dir = self.working_directory();
        let mut names = self.names_in(&state, dir)?;
        let path = names
            .allocate_path(&parse_name(record.name())?, dir, &self.config().extension)?
            .path;
        save_bitmap(record.content(), &path)?;

        let key = NormalizedPath::new(&path)?;
        let index = state.index.position(&key);
        state.select_path(key, path.clone(), index);
        info!(path = %path.display(), "record saved");
        Ok(path)
    }

    /// Save `records` into `folder_name` under the working directory.
    ///
    /// The folder name is sanitized and the folder created. Each record is
    /// saved under its de-masked name, renumbered so that no two files in
    /// the folder collide. Returns the saved paths in input order.
    ///
    /// Fails with [`StoreError::OutsideWorkingDirectory`] if the folder
    /// would not lie inside the working directory.
    pub fn save_batch(&self, folder_name: &str, records: &[Record]) -> StoreResult<Vec<PathBuf>> {
        let dir = self.working_directory();
        let folder = dir.join(sanitize_folder_name(folder_name));
        if !self.is_working_directory(&folder) || !is_single_component(&folder, dir) {
            return Err(StoreError::OutsideWorkingDirectory {
                path: folder,
                working_dir: dir.to_path_buf(),
            });
        }
        fs::create_dir_all(&folder)?;

        let state = self.lock();
        let mut names = self.names_in(&state, &folder)?;
        let extension = &self.config().extension;

        let mut paths = Vec::with_capacity(records.len());
        for record in records {
            let hint = NameHint::plain(parse_name(record.name())?.base);
            let allocation = names.allocate_path(&hint, &folder, extension)?;
            save_bitmap(record.content(), &allocation.path)?;
            paths.push(allocation.path);
        }

        info!(folder = %folder.display(), saved = paths.len(), "batch saved");
        Ok(paths)
    }

    /// An allocator seeded with the file names of every indexed entry plus
    /// the image files already in `dir`.
    fn names_in(&self, state: &StoreState, dir: &Path) -> StoreResult<NameAllocator> {
        let mut names = NameAllocator::seeded(state.index.entries().map(|e| file_stem(&e.path)))?;
        for stem in self.image_stems(dir)? {
            if !names.contains(&stem) {
                names.allocate(&parse_name(&stem)?)?;
            }
        }
        Ok(names)
    }

    fn image_stems(&self, dir: &Path) -> StoreResult<Vec<String>> {
        let entries = match fs::read_dir(dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };
        let mut stems = Vec::new();
        for entry in entries {
            let path = entry?.path();
            if path.is_file() && is_image_file(&path, &self.config().extension) {
                stems.push(file_stem(&path));
            }
        }
        Ok(stems)
    }
}
