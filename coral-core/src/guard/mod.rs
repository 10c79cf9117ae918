//! Memory reclamation seam for the lock-free collections.
//!
//! Nodes that are physically unlinked from an [`OrderedList`] may still be
//! held by concurrent traversals, so they cannot be freed on the spot. Every
//! collection is generic over a `Guard` that decides when a retired node is
//! actually released:
//!
//! ```text
//! OrderedList<T, G: Guard>
//!     │
//!     ├── OrderedList<T, EpochGuard>      (coral-crossbeam, production)
//!     └── OrderedList<T, DeferredGuard>   (tests, frees on collection drop)
//! ```
//!
//! Protocol followed by every collection:
//!
//! 1. Each public operation calls [`Guard::pin`] once and keeps the returned
//!    read guard alive for its whole traversal.
//! 2. Only the thread whose CAS set a node's deletion mark retires it, and only
//!    after the node is provably unreachable from the list.
//! 3. Sentinels and the list head are never retired; they are freed by the
//!    collection's `Drop`.
//!
//! [`OrderedList`]: crate::data_structures::OrderedList

mod deferred_guard;

use std::ops::Deref;

pub use deferred_guard::{DeferredGuard, DeferredRef};

/// A memory reclamation strategy shared by all nodes of one collection.
///
/// # Safety Contract
///
/// Implementations must ensure:
/// 1. Nodes passed to `defer_destroy` are not freed while any read guard that
///    could have observed them is still alive
/// 2. `GuardedRef` keeps the referenced data valid for its lifetime
///
/// The guard value is stored inside the collection and must be `Send + Sync`.
/// Thread pinning happens per operation through [`Guard::pin`].
///
pub trait Guard: Sized + Default + Send + Sync {
    /// A reference that owns its own protection.
    type GuardedRef<'a, T: 'a>: Deref<Target = T>;

    /// Read protection for the duration of one operation or one iterator.
    ///
    /// Epoch based guards hold a pinned participant here. Guards that never
    /// free before the collection drops use `()`.
    type ReadGuard: Sized;

    /// Pin an active read guard.
    fn pin() -> Self::ReadGuard;

    /// Retire a node. It is released once no reader can reach it.
    ///
    /// # Safety
    ///
    /// - `node` must be a valid pointer allocated by the collection
    /// - `node` must be unreachable from the collection
    /// - `node` must not be retired twice
    /// - `dealloc` must be the matching deallocation function for `node`
    ///
    unsafe fn defer_destroy<N>(&self, node: *mut N, dealloc: unsafe fn(*mut N));

    /// Wrap a raw pointer into a self-protecting reference.
    ///
    /// # Safety
    ///
    /// - `ptr` must be protected by a read guard alive at the time of the call
    /// - The data must remain valid for lifetime `'a`
    ///
    unsafe fn make_ref<'a, T: 'a>(ptr: *const T) -> Self::GuardedRef<'a, T>;
}
