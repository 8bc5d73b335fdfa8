//! Cooperative cancellation of long store operations.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, OnceLock};

use tracing::info;

/// Shared flag saying whether long operations may keep running.
///
/// Bulk scans and removals poll [`is_allowed`](Self::is_allowed) at loop
/// boundaries and stop early once it reads `false`. Stopping is best
/// effort: a step already past its last poll completes, and nothing done
/// before the stop is rolled back.
///
/// Clones share the same flag. Stores built with
/// [`DualIndexStore::new`](crate::DualIndexStore::new) share
/// [`CancellationFlag::global`]; tests inject their own.
#[derive(Clone, Debug)]
pub struct CancellationFlag {
    allowed: Arc<AtomicBool>,
}

impl CancellationFlag {
    /// A new flag that allows long operations.
    pub fn new() -> Self {
        Self {
            allowed: Arc::new(AtomicBool::new(true)),
        }
    }

    /// The process-wide flag.
    pub fn global() -> &'static CancellationFlag {
        static GLOBAL: OnceLock<CancellationFlag> = OnceLock::new();
        GLOBAL.get_or_init(CancellationFlag::new)
    }

    /// Returns `true` while long operations may continue.
    pub fn is_allowed(&self) -> bool {
        self.allowed.load(Ordering::Acquire)
    }

    /// Ask running operations to stop.
    pub fn cancel(&self) {
        if self.allowed.swap(false, Ordering::AcqRel) {
            info!("long operations cancelled");
        }
    }

    /// Allow long operations again.
    pub fn allow(&self) {
        self.allowed.store(true, Ordering::Release);
    }
}

impl Default for CancellationFlag {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clones_share_state() {
        let a = CancellationFlag::new();
        let b = a.clone();
        assert!(b.is_allowed());
        a.cancel();
        assert!(!b.is_allowed());
        b.allow();
        assert!(a.is_allowed());
    }

    #[test]
    fn independent_flags_do_not_interfere() {
        let a = CancellationFlag::new();
        let b = CancellationFlag::new();
        a.cancel();
        assert!(b.is_allowed());
    }

    #[test]
    fn global_is_a_singleton() {
        assert!(std::ptr::eq(CancellationFlag::global(), CancellationFlag::global()));
    }
}
