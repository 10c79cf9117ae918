// Atomic (successor, deletion-mark) pair packed into one pointer word.
//
// Bit layout:
//   Bit 0:     DELETE_MARK - the node owning this link is logically deleted
//   Bits 1..:  successor address (nodes are at least 2-byte aligned)
//
// The pair is only ever updated by a single-word CAS, so target and mark
// change together. A set mark is never cleared.
//
use std::sync::atomic::{AtomicPtr, Ordering};

const DELETE_MARK: usize = 0b01;

#[inline]
fn compose<T>(target: *mut T, mark: bool) -> *mut T {
    debug_assert_eq!(target as usize & DELETE_MARK, 0, "misaligned link target");
    (target as usize | mark as usize) as *mut T
}

#[inline]
fn decompose<T>(raw: *mut T) -> (*mut T, bool) {
    (
        (raw as usize & !DELETE_MARK) as *mut T,
        raw as usize & DELETE_MARK != 0,
    )
}

/// A successor pointer with a deletion mark, updated atomically as a unit.
pub(crate) struct MarkedLink<T> {
    raw: AtomicPtr<T>,
}

impl<T> MarkedLink<T> {
    // =========================================================================
    // Construction
    // =========================================================================

    #[inline]
    pub(crate) fn new(target: *mut T) -> Self {
        MarkedLink {
            raw: AtomicPtr::new(compose(target, false)),
        }
    }

    // =========================================================================
    // Reads
    // =========================================================================

    /// Load `(target, mark)` (Acquire ordering).
    #[inline]
    pub(crate) fn get(&self) -> (*mut T, bool) {
        decompose(self.raw.load(Ordering::Acquire))
    }

    /// Load the target, ignoring the mark.
    #[inline]
    pub(crate) fn target(&self) -> *mut T {
        self.get().0
    }

    #[inline]
    pub(crate) fn is_marked(&self) -> bool {
        self.get().1
    }

    // =========================================================================
    // Writes
    // =========================================================================

    /// Store an unmarked target (Release ordering).
    ///
    /// Only valid while the owning node is still private to one thread.
    #[inline]
    pub(crate) fn set_target(&self, target: *mut T) {
        self.raw.store(compose(target, false), Ordering::Release)
    }

    /// CAS the pair from `(expected_target, expected_mark)` to
    /// `(new_target, new_mark)` (AcqRel/Acquire ordering).
    ///
    /// A failure only means another thread changed the pair since it was read.
    #[inline]
    pub(crate) fn compare_and_set(
        &self,
        expected_target: *mut T,
        expected_mark: bool,
        new_target: *mut T,
        new_mark: bool,
    ) -> bool {
        self.raw
            .compare_exchange(
                compose(expected_target, expected_mark),
                compose(new_target, new_mark),
                Ordering::AcqRel,
                Ordering::Acquire,
            )
            .is_ok()
    }

    /// Set the deletion mark on an unmarked link that still points at
    /// `expected_target`. Returns true if this call set the mark.
    #[inline]
    pub(crate) fn try_mark(&self, expected_target: *mut T) -> bool {
        self.compare_and_set(expected_target, false, expected_target, true)
    }
}

impl<T> std::fmt::Debug for MarkedLink<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let (target, mark) = self.get();
        f.debug_struct("MarkedLink")
            .field("target", &target)
            .field("deleted", &mark)
            .finish()
    }
}
