use std::cmp::Ordering;
use std::fmt;
use std::ptr;

use crate::data_structures::concurrent_collection::ConcurrentCollection;
use crate::data_structures::internal::{MarkedLink, OrderProbe};
use crate::data_structures::ordered::ordered_list_iter::Iter;
use crate::error::CollectionError;
use crate::guard::Guard;

pub(crate) type NodePtr<T> = *mut ListNode<T>;

///
/// Lock-free ordered singly linked list after Harris, 'A Pragmatic
/// Implementation of Non-Blocking Linked-Lists'.
///
/// The same list backs the split-ordered hash map, which starts its traversals
/// from bucket sentinels instead of the head.
///
// =============================================================================
// STRUCTURE
// =============================================================================
//
// ┌──────┐    ┌──────┐    ┌──────┐    ┌──────┐
// │ HEAD │───►│  10  │───►│  20  │───►│  30  │───► null
// │(None)│    │      │    │      │    │      │
// └──────┘    └──────┘    └──────┘    └──────┘
//
// Each node's `next` is a MarkedLink. A set mark on X.next means X itself is
// logically deleted; X.next is frozen from then on.
//
// INVARIANTS:
// 1. Elements are strictly ascending; no two linked nodes compare equal
// 2. The head carries no element, is never marked and never retired
// 3. A node that is unlinked never becomes reachable again: linking a node
//    requires a CAS on an unmarked predecessor that still points at it
// 4. Only the thread whose CAS set the mark retires the node, and only once
//    the node is unreachable
//
// =============================================================================
// DELETE (two phases)
// =============================================================================
//
// Before:   pred ──────► curr ──────► succ
//
// Logical:  pred ──────► curr ──╳───► succ      CAS curr.next (succ,0)->(succ,1)
//
// Physical: pred ─────────────────────► succ    CAS pred.next (curr,0)->(succ,0)
//
// Any traversal that meets a marked node performs the physical step itself
// (`help_unlink`). If the owner's own physical CAS fails, it re-runs `find`
// from its start node: `find` cannot return before it has snipped every
// marked node preceding its result, so afterwards the node is unreachable and
// can be handed to the guard.
//
// =============================================================================
//
pub struct ListNode<T> {
    data: Option<T>,
    pub(crate) next: MarkedLink<ListNode<T>>,
}

impl<T> ListNode<T> {
    fn new(data: T) -> Self {
        ListNode {
            data: Some(data),
            next: MarkedLink::new(ptr::null_mut()),
        }
    }

    fn new_head() -> Self {
        ListNode {
            data: None,
            next: MarkedLink::new(ptr::null_mut()),
        }
    }

    /// Element stored in a non-head node.
    #[inline]
    pub(crate) fn element(&self) -> &T {
        match &self.data {
            Some(data) => data,
            None => unreachable!("list head carries no element"),
        }
    }

    unsafe fn dealloc_ptr(ptr: *mut Self) {
        drop(unsafe { Box::from_raw(ptr) });
    }
}

impl<T: fmt::Debug> fmt::Debug for ListNode<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ListNode")
            .field("data", &self.data)
            .field("next", &self.next)
            .finish()
    }
}

// Two adjacent nodes found by `find`: `pred < probe <= curr`, `curr` may be null.
//
#[derive(Debug)]
pub(crate) struct NodeLocation<T> {
    pub pred: NodePtr<T>,
    pub curr: NodePtr<T>,
}

impl<T> Copy for NodeLocation<T> {}

impl<T> Clone for NodeLocation<T> {
    fn clone(&self) -> Self {
        *self
    }
}

pub struct OrderedList<T, G: Guard> {
    head: NodePtr<T>,
    /// Receives every node this list retires.
    guard: G,
}

// Nodes are shared between threads through the list; elements are handed out
// by reference (`find`) and by clone.
unsafe impl<T: Send + Sync, G: Guard> Send for OrderedList<T, G> {}
unsafe impl<T: Send + Sync, G: Guard> Sync for OrderedList<T, G> {}

impl<T, G> OrderedList<T, G>
where
    T: Ord,
    G: Guard,
{
    pub fn new() -> Self {
        OrderedList {
            head: Box::into_raw(Box::new(ListNode::new_head())),
            guard: G::default(),
        }
    }

    /// The reclamation guard owned by this list.
    pub fn guard(&self) -> &G {
        &self.guard
    }

    #[inline]
    pub(crate) fn head_node(&self) -> NodePtr<T> {
        self.head
    }

    // =========================================================================
    // Traversal primitives. Callers must hold a read guard and pass a start
    // node that is never marked (the head or a bucket sentinel) and that
    // precedes every element equal to the probe.
    // =========================================================================

    /// Named helping step: snip the marked `curr` out from behind `pred`.
    ///
    /// Fails if `pred` got marked or no longer points at `curr`. Helpers never
    /// retire the snipped node; its deleter does.
    #[inline]
    fn help_unlink(pred: NodePtr<T>, curr: NodePtr<T>, succ: NodePtr<T>) -> bool {
        unsafe { (*pred).next.compare_and_set(curr, false, succ, false) }
    }

    /// Locate `pred < probe <= curr`, unlinking every marked node on the way.
    pub(crate) fn find_from<P>(&self, start: NodePtr<T>, probe: &P) -> NodeLocation<T>
    where
        P: OrderProbe<T> + ?Sized,
    {
        'retry: loop {
            let mut pred = start;
            let mut curr = unsafe { (*pred).next.target() };

            loop {
                if curr.is_null() {
                    return NodeLocation { pred, curr };
                }

                let (succ, deleted) = unsafe { (*curr).next.get() };

                if deleted {
                    if !Self::help_unlink(pred, curr, succ) {
                        // pred changed under us or got deleted itself.
                        continue 'retry;
                    }
                    curr = succ;
                    continue;
                }

                let element = unsafe { (*curr).element() };
                if probe.compare_item(element) != Ordering::Less {
                    return NodeLocation { pred, curr };
                }

                pred = curr;
                curr = succ;
            }
        }
    }

    /// Live node equal to `probe`, if any.
    pub(crate) fn find_node_from<P>(&self, start: NodePtr<T>, probe: &P) -> Option<NodePtr<T>>
    where
        P: OrderProbe<T> + ?Sized,
    {
        let location = self.find_from(start, probe);
        if location.curr.is_null() {
            return None;
        }

        let element = unsafe { (*location.curr).element() };
        (probe.compare_item(element) == Ordering::Equal).then_some(location.curr)
    }

    /// Link `data` after `start`.
    ///
    /// Returns `Ok(new_node)` on success or `Err(existing)` with the live node
    /// that already holds an equal element; `data` is dropped in that case.
    pub(crate) fn insert_from(&self, start: NodePtr<T>, data: T) -> Result<NodePtr<T>, NodePtr<T>> {
        let new_node = Box::into_raw(Box::new(ListNode::new(data)));

        loop {
            let element = unsafe { (*new_node).element() };
            let location = self.find_from(start, element);
            let (pred, curr) = (location.pred, location.curr);

            if !curr.is_null() && unsafe { (*curr).element() } == element {
                unsafe { ListNode::dealloc_ptr(new_node) };
                return Err(curr);
            }

            // new_node is still private, a plain store is enough.
            unsafe { (*new_node).next.set_target(curr) };

            if unsafe { (*pred).next.compare_and_set(curr, false, new_node, false) } {
                return Ok(new_node);
            }
        }
    }

    /// Delete the live node equal to `probe`.
    ///
    /// `take` runs on the element after this thread won the logical delete and
    /// before the node is retired. Returns `None` if no live node matched or a
    /// concurrent delete won the race.
    pub(crate) fn delete_from<P, R, F>(&self, start: NodePtr<T>, probe: &P, take: F) -> Option<R>
    where
        P: OrderProbe<T> + ?Sized,
        F: FnOnce(&T) -> R,
    {
        loop {
            let location = self.find_from(start, probe);
            let (pred, curr) = (location.pred, location.curr);

            if curr.is_null() {
                return None;
            }

            let element = unsafe { (*curr).element() };
            if probe.compare_item(element) != Ordering::Equal {
                return None;
            }

            let (succ, deleted) = unsafe { (*curr).next.get() };
            if deleted {
                return None;
            }

            if !unsafe { (*curr).next.try_mark(succ) } {
                if unsafe { (*curr).next.is_marked() } {
                    // Another deleter won.
                    return None;
                }
                // A node was linked right after curr, retry.
                continue;
            }

            let result = take(element);
            self.unlink_marked(start, pred, curr, succ, probe);
            unsafe {
                self.guard.defer_destroy(curr, ListNode::dealloc_ptr);
            }
            return Some(result);
        }
    }

    /// Complete the physical delete of `node`, which this thread marked.
    ///
    /// Returns only once `node` is unreachable.
    fn unlink_marked<P>(&self, start: NodePtr<T>, pred: NodePtr<T>, node: NodePtr<T>, succ: NodePtr<T>, probe: &P)
    where
        P: OrderProbe<T> + ?Sized,
    {
        if Self::help_unlink(pred, node, succ) {
            return;
        }

        // Either a helper already snipped it, or pred moved on. A fresh search
        // snips every marked node before its result, including this one.
        self.find_from(start, probe);
    }

    // =========================================================================
    // Public operations
    // =========================================================================

    /// Insert `key`. Returns false if an equal element is already present.
    pub fn insert(&self, key: T) -> bool {
        let _guard = G::pin();
        self.insert_from(self.head, key).is_ok()
    }

    /// Delete `key`. Returns true if this call removed it.
    pub fn delete(&self, key: &T) -> bool {
        let _guard = G::pin();
        self.delete_from(self.head, key, |_| ()).is_some()
    }

    /// Delete `key` and return a clone of the removed element.
    pub fn remove(&self, key: &T) -> Option<T>
    where
        T: Clone,
    {
        let _guard = G::pin();
        self.delete_from(self.head, key, T::clone)
    }

    pub fn contains(&self, key: &T) -> bool {
        let _guard = G::pin();
        self.find_node_from(self.head, key).is_some()
    }

    /// Reference to the stored element equal to `key`.
    ///
    /// The returned reference keeps the element alive even if it is removed
    /// concurrently.
    pub fn find(&self, key: &T) -> Option<G::GuardedRef<'_, T>> {
        let _guard = G::pin();
        self.find_node_from(self.head, key)
            .map(|node| unsafe { G::make_ref((*node).element() as *const T) })
    }

    /// Apply `f` to the stored element equal to `key`, under protection.
    pub fn find_and_apply<R, F>(&self, key: &T, f: F) -> Option<R>
    where
        F: FnOnce(&T) -> R,
    {
        let _guard = G::pin();
        self.find_node_from(self.head, key)
            .map(|node| f(unsafe { (*node).element() }))
    }

    /// Number of live elements, counted by traversal.
    ///
    /// Approximate while other threads mutate the list.
    pub fn len(&self) -> usize {
        let mut iter = self.iter();
        let mut count = 0;
        while iter.next_element().is_some() {
            count += 1;
        }
        count
    }

    pub fn is_empty(&self) -> bool {
        !self.iter().has_next()
    }

    /// Smallest live element.
    pub fn peek_first(&self) -> Result<T, CollectionError>
    where
        T: Clone,
    {
        self.iter().try_next()
    }

    /// Position of `key` among the live elements.
    pub fn index_of(&self, key: &T) -> Option<usize> {
        let mut iter = self.iter();
        let mut index = 0;
        while let Some(element) = iter.next_element() {
            match element.cmp(key) {
                Ordering::Less => index += 1,
                Ordering::Equal => return Some(index),
                Ordering::Greater => return None,
            }
        }
        None
    }

    /// Clone of the live element at `index`.
    pub fn get(&self, index: usize) -> Option<T>
    where
        T: Clone,
    {
        let mut iter = self.iter();
        for _ in 0..index {
            iter.next_element()?;
        }
        iter.next_element().cloned()
    }

    /// Weakly consistent iterator over clones of the live elements.
    pub fn iter(&self) -> Iter<'_, T, G> {
        Iter::new(self)
    }
}

impl<T: Ord, G: Guard> Default for OrderedList<T, G> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T, G: Guard> Drop for OrderedList<T, G> {
    fn drop(&mut self) {
        // No operation is in flight, so every deleted node was already
        // unlinked and handed to the guard.
        let mut curr = self.head;
        while !curr.is_null() {
            let node = unsafe { Box::from_raw(curr) };
            let (next, deleted) = node.next.get();
            debug_assert!(!deleted, "marked node still linked at drop");
            curr = next;
        }
    }
}

impl<'a, T: Ord + Clone, G: Guard> IntoIterator for &'a OrderedList<T, G> {
    type Item = T;
    type IntoIter = Iter<'a, T, G>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl<T: Ord + fmt::Debug, G: Guard> fmt::Debug for OrderedList<T, G> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut list = f.debug_list();
        let mut iter = self.iter();
        while let Some(element) = iter.next_element() {
            list.entry(element);
        }
        list.finish()
    }
}

impl<T, G> ConcurrentCollection<T> for OrderedList<T, G>
where
    T: Ord + Clone,
    G: Guard,
{
    fn insert(&self, key: T) -> bool {
        OrderedList::insert(self, key)
    }

    fn delete(&self, key: &T) -> bool {
        OrderedList::delete(self, key)
    }

    fn contains(&self, key: &T) -> bool {
        OrderedList::contains(self, key)
    }

    fn len(&self) -> usize {
        OrderedList::len(self)
    }

    fn to_vec(&self) -> Vec<T> {
        self.iter().collect()
    }
}
