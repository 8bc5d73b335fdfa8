//! Recursive enumeration of record image files.

use std::path::{Path, PathBuf};

use walkdir::WalkDir;

use crate::error::{IoError, IoResult};

/// Returns `true` if `path` has the extension `extension`, ignoring case.
pub fn is_image_file(path: &Path, extension: &str) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case(extension))
}

/// Returns `true` if `path` reads as a directory: it ends with a separator
/// or has no extension. The filesystem is not consulted.
pub fn looks_like_directory(path: &Path) -> bool {
    let text = path.as_os_str().to_string_lossy();
    text.ends_with('/') || text.ends_with('\\') || path.extension().is_none()
}

/// Walk `root` recursively and yield every image file with `extension`.
///
/// The walk stops as soon as `keep_going` returns `false`. Traversal errors
/// are yielded in place and do not end the walk.
pub fn scan_images<'a>(
    root: &Path,
    extension: &'a str,
    keep_going: impl Fn() -> bool + 'a,
) -> impl Iterator<Item = IoResult<PathBuf>> + 'a {
    let root_path = root.to_path_buf();
    WalkDir::new(root)
        .follow_links(false)
        .sort_by_file_name()
        .into_iter()
        .take_while(move |_| keep_going())
        .filter_map(move |entry| match entry {
            Ok(entry) => {
                let is_match = entry.file_type().is_file() && is_image_file(entry.path(), extension);
                is_match.then(|| Ok(entry.into_path()))
            }
            Err(source) => {
                let path = source
                    .path()
                    .map(Path::to_path_buf)
                    .unwrap_or_else(|| root_path.clone());
                Some(Err(IoError::Scan { path, source }))
            }
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;
    use std::fs;

    #[test]
    fn extension_match_is_case_insensitive() {
        assert!(is_image_file(Path::new("/a/b.BMP"), "bmp"));
        assert!(is_image_file(Path::new("c.bmp"), "BMP"));
        assert!(!is_image_file(Path::new("c.png"), "bmp"));
        assert!(!is_image_file(Path::new("bmp"), "bmp"));
    }

    #[test]
    fn directory_heuristic() {
        assert!(looks_like_directory(Path::new("/work/dir/")));
        assert!(looks_like_directory(Path::new("/work/dir")));
        assert!(!looks_like_directory(Path::new("/work/a.bmp")));
    }

    #[test]
    fn scan_finds_nested_images_only() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir_all(dir.path().join("sub/deeper")).unwrap();
        fs::write(dir.path().join("a.bmp"), b"").unwrap();
        fs::write(dir.path().join("note.txt"), b"").unwrap();
        fs::write(dir.path().join("sub/B.BMP"), b"").unwrap();
        fs::write(dir.path().join("sub/deeper/c.bmp"), b"").unwrap();

        let found: Vec<PathBuf> = scan_images(dir.path(), "bmp", || true)
            .collect::<IoResult<_>>()
            .unwrap();
        assert_eq!(found.len(), 3);
        assert!(found.iter().all(|p| is_image_file(p, "bmp")));
    }

    #[test]
    fn scan_stops_when_told() {
        let dir = tempfile::tempdir().unwrap();
        for i in 0..10 {
            fs::write(dir.path().join(format!("{i}.bmp")), b"").unwrap();
        }

        let budget = Cell::new(4usize);
        let found = scan_images(dir.path(), "bmp", || {
            let left = budget.get();
            budget.set(left.saturating_sub(1));
            left > 0
        })
        .count();
        // The root directory entry consumes one check.
        assert_eq!(found, 3);
    }

    #[test]
    fn missing_root_yields_scan_error() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("nope");
        let results: Vec<_> = scan_images(&missing, "bmp", || true).collect();
        assert_eq!(results.len(), 1);
        assert!(matches!(&results[0], Err(IoError::Scan { path, .. }) if *path == missing));
    }
}
