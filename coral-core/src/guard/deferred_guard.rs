//! Guard that keeps every retired node alive until the owning collection drops.
//!
//! Retired nodes are collected on a push-only Treiber stack, so retiring never
//! blocks. The stack is drained and the nodes are released in `Drop`.

use std::ops::Deref;
use std::ptr;
use std::sync::atomic::{AtomicPtr, AtomicUsize, Ordering};

use super::Guard;

/// A guard that defers all node destruction until the guard is dropped.
///
/// Useful for tests where destruction timing must be predictable. Memory grows
/// with the number of removals, so it is a poor fit for long-running workloads.
///
pub struct DeferredGuard {
    retired: AtomicPtr<RetiredNode>,
    retired_count: AtomicUsize,
}

struct RetiredNode {
    ptr: *mut (),
    dealloc: unsafe fn(*mut ()),
    next: *mut RetiredNode,
}

impl DeferredGuard {
    pub fn new() -> Self {
        DeferredGuard {
            retired: AtomicPtr::new(ptr::null_mut()),
            retired_count: AtomicUsize::new(0),
        }
    }

    /// Number of nodes retired so far.
    pub fn retired_count(&self) -> usize {
        self.retired_count.load(Ordering::Relaxed)
    }

    fn push(&self, node: *mut RetiredNode) {
        let mut head = self.retired.load(Ordering::Relaxed);
        loop {
            unsafe {
                (*node).next = head;
            }
            match self
                .retired
                .compare_exchange_weak(head, node, Ordering::Release, Ordering::Relaxed)
            {
                Ok(_) => break,
                Err(actual) => head = actual,
            }
        }
        self.retired_count.fetch_add(1, Ordering::Relaxed);
    }
}

impl Default for DeferredGuard {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for DeferredGuard {
    fn drop(&mut self) {
        let mut curr = *self.retired.get_mut();

        #[cfg(debug_assertions)]
        {
            let mut seen = std::collections::HashSet::new();
            let mut walk = curr;
            while !walk.is_null() {
                let node = unsafe { &*walk };
                if !seen.insert(node.ptr as usize) {
                    panic!("node {:#x} retired twice", node.ptr as usize);
                }
                walk = node.next;
            }
        }

        #[cfg(feature = "tracing")]
        tracing::trace!(retired = *self.retired_count.get_mut(), "releasing deferred nodes");

        while !curr.is_null() {
            let retired = unsafe { Box::from_raw(curr) };
            unsafe {
                (retired.dealloc)(retired.ptr);
            }
            curr = retired.next;
        }
    }
}

/// Reference handed out by [`DeferredGuard`].
///
/// Valid for as long as the collection, since nothing is freed before it drops.
///
pub struct DeferredRef<'a, T> {
    data: &'a T,
}

impl<'a, T> DeferredRef<'a, T> {
    pub fn new(data: &'a T) -> Self {
        DeferredRef { data }
    }
}

impl<T> Deref for DeferredRef<'_, T> {
    type Target = T;

    fn deref(&self) -> &Self::Target {
        self.data
    }
}

impl<T: std::fmt::Debug> std::fmt::Debug for DeferredRef<'_, T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "DeferredRef({:?})", self.data)
    }
}

impl Guard for DeferredGuard {
    type GuardedRef<'a, T: 'a> = DeferredRef<'a, T>;

    // Protection comes from the guard stored in the collection.
    type ReadGuard = ();

    fn pin() -> Self::ReadGuard {}

    unsafe fn defer_destroy<N>(&self, node: *mut N, dealloc: unsafe fn(*mut N)) {
        let retired = Box::into_raw(Box::new(RetiredNode {
            ptr: node as *mut (),
            dealloc: unsafe { std::mem::transmute::<unsafe fn(*mut N), unsafe fn(*mut ())>(dealloc) },
            next: ptr::null_mut(),
        }));
        self.push(retired);
    }

    unsafe fn make_ref<'a, T: 'a>(ptr: *const T) -> Self::GuardedRef<'a, T> {
        DeferredRef::new(unsafe { &*ptr })
    }
}
