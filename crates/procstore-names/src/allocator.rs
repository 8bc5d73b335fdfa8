//! Collision-free name allocation within one namespace.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::error::{NameError, NameResult};
use crate::mask::{mask, parse_name, NameHint, TAG_SEPARATOR};

/// A name handed out by [`NameAllocator::allocate_path`] with the file path
/// it maps to.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Allocation {
    pub name: String,
    pub path: PathBuf,
}

/// Hands out names that are unique (case-insensitively) within one batch.
///
/// Build one allocator per namespace (a working directory, a target folder,
/// a rename batch), seeded with the names already present, and reuse it for
/// every item of the batch so the seed set is derived once.
#[derive(Clone, Debug, Default)]
pub struct NameAllocator {
    used: HashSet<String>,
}

impl NameAllocator {
    /// Create an allocator with no names in use.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an allocator seeded with existing display names.
    ///
    /// Each name is de-masked and allocated in turn, so existing names that
    /// already collide are accounted for the same way later allocations are.
    pub fn seeded<I, S>(names: I) -> NameResult<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut allocator = Self::new();
        for name in names {
            let hint = parse_name(name.as_ref())?;
            allocator.allocate(&hint)?;
        }
        debug!(names = allocator.used.len(), "name allocator seeded");
        Ok(allocator)
    }

    /// Reserve a unique name for `hint` and return it.
    ///
    /// A hint without a number takes its base name as-is when free.
    /// Otherwise `{base}{separator}{k}` is probed for increasing `k`, starting
    /// at the hint's number (or 0) and wrapping around `u64`. The search fails
    /// only once it arrives back at the start.
    pub fn allocate(&mut self, hint: &NameHint) -> NameResult<String> {
        let key = hint.base.to_lowercase();

        if hint.number.is_none() && self.used.insert(key.clone()) {
            return Ok(hint.base.clone());
        }

        let start = hint.number.unwrap_or(0);
        let mut k = start;
        loop {
            if self.used.insert(format!("{key}{TAG_SEPARATOR}{k}")) {
                return Ok(mask(&hint.base, k));
            }
            k = k.wrapping_add(1);
            if k == start {
                return Err(NameError::Exhausted {
                    base: hint.base.clone(),
                });
            }
        }
    }

    /// Reserve a unique name and map it to `{dir}/{name}.{extension}`.
    pub fn allocate_path(
        &mut self,
        hint: &NameHint,
        dir: &Path,
        extension: &str,
    ) -> NameResult<Allocation> {
        let name = self.allocate(hint)?;
        let path = dir.join(format!("{name}.{extension}"));
        Ok(Allocation { name, path })
    }

    /// Returns `true` if `name` (case-insensitive) is already taken.
    pub fn contains(&self, name: &str) -> bool {
        self.used.contains(&name.to_lowercase())
    }

    /// Number of names in use.
    pub fn len(&self) -> usize {
        self.used.len()
    }

    /// Returns `true` if no name is in use.
    pub fn is_empty(&self) -> bool {
        self.used.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn second_plain_hint_gets_number_zero() {
        let mut names = NameAllocator::new();
        assert_eq!(names.allocate(&NameHint::plain("foo")).unwrap(), "foo");
        assert_eq!(names.allocate(&NameHint::plain("foo")).unwrap(), "foo!0");
        assert_eq!(names.allocate(&NameHint::plain("foo")).unwrap(), "foo!1");
    }

    #[test]
    fn collisions_are_case_insensitive() {
        let mut names = NameAllocator::new();
        names.allocate(&NameHint::plain("Foo")).unwrap();
        assert_eq!(names.allocate(&NameHint::plain("FOO")).unwrap(), "FOO!0");
        assert!(names.contains("foo!0"));
    }

    #[test]
    fn numbered_hint_starts_at_its_number() {
        let mut names = NameAllocator::new();
        assert_eq!(names.allocate(&NameHint::numbered("a", 5)).unwrap(), "a!5");
        assert_eq!(names.allocate(&NameHint::numbered("a", 5)).unwrap(), "a!6");
        // The plain name stays free while only numbered variants are taken.
        assert_eq!(names.allocate(&NameHint::plain("a")).unwrap(), "a");
    }

    #[test]
    fn probing_wraps_around() {
        let mut names = NameAllocator::new();
        let max = NameHint::numbered("w", u64::MAX);
        assert_eq!(names.allocate(&max).unwrap(), format!("w!{}", u64::MAX));
        assert_eq!(names.allocate(&max).unwrap(), "w!0");
    }

    #[test]
    fn seeded_reserves_existing_names() {
        let mut names = NameAllocator::seeded(["seven", "seven!0", "eight!3"]).unwrap();
        assert_eq!(names.len(), 3);
        assert_eq!(names.allocate(&NameHint::plain("seven")).unwrap(), "seven!1");
        assert_eq!(names.allocate(&NameHint::numbered("eight", 3)).unwrap(), "eight!4");
    }

    #[test]
    fn seeded_disambiguates_duplicates_among_existing() {
        // Same file name in two folders: the second one counts as "x!0".
        let mut names = NameAllocator::seeded(["x", "X"]).unwrap();
        assert!(names.contains("x!0"));
        assert_eq!(names.allocate(&NameHint::plain("x")).unwrap(), "x!1");
    }

    #[test]
    fn seeded_rejects_empty_name() {
        assert_eq!(NameAllocator::seeded([""]).unwrap_err(), NameError::Empty);
    }

    #[test]
    fn allocate_path_appends_extension() {
        let mut names = NameAllocator::seeded(["pic"]).unwrap();
        let a = names
            .allocate_path(&NameHint::plain("pic"), Path::new("/work"), "bmp")
            .unwrap();
        assert_eq!(a.name, "pic!0");
        assert_eq!(a.path, Path::new("/work").join("pic!0.bmp"));
    }

    proptest! {
        #[test]
        fn allocations_never_repeat(
            hints in proptest::collection::vec(("[a-cA-C]{1,2}", proptest::option::of(0u64..4)), 1..40)
        ) {
            let mut names = NameAllocator::new();
            let mut seen = HashSet::new();
            for (base, number) in hints {
                let name = names.allocate(&NameHint { base, number }).unwrap();
                prop_assert!(seen.insert(name.to_lowercase()), "duplicate {name}");
            }
        }
    }
}
