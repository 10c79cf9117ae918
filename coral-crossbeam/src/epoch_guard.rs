//! `Guard` implementation backed by the global crossbeam-epoch collector.
//!
//! ```text
//! OrderedList<i32, EpochGuard>
//!     │
//!     ├── every operation pins an epoch::Guard for its traversal
//!     └── retired nodes are freed once all pinned threads have moved on
//! ```

use std::fmt;
use std::ops::Deref;

use coral_core::guard::Guard;
use crossbeam_epoch::{self as epoch, Guard as CrossbeamGuard};

/// Epoch-based memory reclamation guard.
///
/// Zero sized; all reclamation state lives in the global collector, so a
/// collection that stores one stays `Send + Sync`. Iterators hold a pinned
/// `crossbeam_epoch::Guard` and are therefore `!Send`.
#[derive(Clone, Copy, Default, Debug)]
pub struct EpochGuard;

/// A reference that keeps its own epoch pinned.
///
/// The referenced node cannot be reclaimed until this value is dropped, even
/// if it is removed from the collection in the meantime.
pub struct EpochRef<'a, T> {
    _guard: CrossbeamGuard,
    reference: &'a T,
}

impl<'a, T> EpochRef<'a, T> {
    /// # Safety
    ///
    /// `reference` must stay valid for as long as `guard` is pinned.
    pub(crate) unsafe fn new(guard: CrossbeamGuard, reference: &'a T) -> Self {
        EpochRef {
            _guard: guard,
            reference,
        }
    }

    pub fn get(&self) -> &T {
        self.reference
    }
}

impl<T> Deref for EpochRef<'_, T> {
    type Target = T;

    fn deref(&self) -> &Self::Target {
        self.reference
    }
}

impl<T: fmt::Display> fmt::Display for EpochRef<'_, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(self.reference, f)
    }
}

impl<T: fmt::Debug> fmt::Debug for EpochRef<'_, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "EpochRef({:?})", self.reference)
    }
}

impl Guard for EpochGuard {
    type GuardedRef<'a, T: 'a> = EpochRef<'a, T>;

    type ReadGuard = CrossbeamGuard;

    fn pin() -> Self::ReadGuard {
        epoch::pin()
    }

    unsafe fn defer_destroy<N>(&self, node: *mut N, dealloc: unsafe fn(*mut N)) {
        let guard = epoch::pin();
        unsafe {
            guard.defer_unchecked(move || dealloc(node));
        }
    }

    unsafe fn make_ref<'a, T: 'a>(ptr: *const T) -> Self::GuardedRef<'a, T> {
        unsafe { EpochRef::new(epoch::pin(), &*ptr) }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    static FREED: AtomicUsize = AtomicUsize::new(0);

    struct Counted;

    impl Drop for Counted {
        fn drop(&mut self) {
            FREED.fetch_add(1, Ordering::SeqCst);
        }
    }

    unsafe fn free_counted(ptr: *mut Counted) {
        drop(unsafe { Box::from_raw(ptr) });
    }

    #[test]
    fn test_guard_is_zero_sized() {
        assert_eq!(std::mem::size_of::<EpochGuard>(), 0);
    }

    #[test]
    fn test_retired_nodes_are_eventually_freed() {
        let guard = EpochGuard;
        for _ in 0..64 {
            let ptr = Box::into_raw(Box::new(Counted));
            unsafe { guard.defer_destroy(ptr, free_counted) };
        }

        // Repeated pin and flush lets the global epoch advance past the retirements.
        for _ in 0..10_000 {
            if FREED.load(Ordering::SeqCst) == 64 {
                break;
            }
            epoch::pin().flush();
            std::thread::yield_now();
        }
        assert_eq!(FREED.load(Ordering::SeqCst), 64);
    }

    #[test]
    fn test_epoch_ref() {
        let value = 42;
        let _guard = EpochGuard::pin();

        let guarded = unsafe { EpochGuard::make_ref(&value) };
        assert_eq!(*guarded, 42);
        assert_eq!(guarded.get(), &42);
        assert_eq!(format!("{}", guarded), "42");
        assert_eq!(format!("{:?}", guarded), "EpochRef(42)");
    }

    #[test]
    fn test_epoch_ref_outlives_removal() {
        let list: coral_core::OrderedList<String, EpochGuard> = coral_core::OrderedList::new();
        list.insert("kept alive".to_string());

        let found = list.find(&"kept alive".to_string()).unwrap();
        assert!(list.delete(&"kept alive".to_string()));
        assert_eq!(found.as_str(), "kept alive");
    }

    #[test]
    fn test_shared_across_threads() {
        let list: Arc<coral_core::OrderedList<u32, EpochGuard>> = Arc::new(coral_core::OrderedList::new());
        let handles: Vec<_> = (0..4u32)
            .map(|t| {
                let list = Arc::clone(&list);
                std::thread::spawn(move || {
                    for i in 0..250 {
                        assert!(list.insert(t * 250 + i));
                        assert!(list.delete(&(t * 250 + i)));
                    }
                })
            })
            .collect();

        for handle in handles {
            handle.join().unwrap();
        }
        assert!(list.is_empty());
    }
}
