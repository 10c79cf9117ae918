//! Weakly consistent iteration over an [`OrderedList`].
//!
//! The iterator pins one read guard for its whole life and walks `next` links
//! directly, stepping over logically deleted nodes. It never fails because of
//! concurrent mutation:
//!
//! - an element present from construction until the cursor reaches it is
//!   yielded exactly once
//! - an element deleted before the cursor reaches it is skipped
//! - an element inserted concurrently may or may not be yielded
//!
//! A deleted node keeps its frozen `next`, so a cursor parked on a node that
//! gets unlinked still finds its way back into the live list.
//!
//! The iterator holds a read guard and is therefore not meant to be moved to
//! another thread; with `EpochGuard` it is `!Send`.

use std::marker::PhantomData;
use std::ptr;

use crate::data_structures::ordered::ordered_list::{NodePtr, OrderedList};
use crate::error::CollectionError;
use crate::guard::Guard;

pub struct Iter<'a, T, G: Guard> {
    /// Next candidate node. May be marked until `skip_deleted` runs.
    cursor: NodePtr<T>,
    _guard: G::ReadGuard,
    _list: PhantomData<&'a OrderedList<T, G>>,
}

impl<'a, T: Ord, G: Guard> Iter<'a, T, G> {
    pub(crate) fn new(list: &'a OrderedList<T, G>) -> Self {
        let guard = G::pin();
        let cursor = unsafe { (*list.head_node()).next.target() };
        Iter {
            cursor,
            _guard: guard,
            _list: PhantomData,
        }
    }
}

impl<T, G: Guard> Iter<'_, T, G> {
    fn skip_deleted(&mut self) {
        while !self.cursor.is_null() {
            let (next, deleted) = unsafe { (*self.cursor).next.get() };
            if !deleted {
                return;
            }
            self.cursor = next;
        }
    }

    /// True if a live element is reachable from the cursor.
    pub fn has_next(&mut self) -> bool {
        self.skip_deleted();
        !self.cursor.is_null()
    }

    /// Borrow the next live element without advancing.
    pub(crate) fn peek_element(&mut self) -> Option<&T> {
        self.skip_deleted();
        if self.cursor.is_null() {
            return None;
        }
        Some(unsafe { (*self.cursor).element() })
    }

    /// Advance and borrow the element, valid while the iterator lives.
    pub(crate) fn next_element(&mut self) -> Option<&T> {
        self.skip_deleted();
        if self.cursor.is_null() {
            return None;
        }

        let node = self.cursor;
        self.cursor = unsafe { (*node).next.target() };
        Some(unsafe { (*node).element() })
    }

    /// Advance, failing with `NoSuchElement` once the list is exhausted.
    pub fn try_next(&mut self) -> Result<T, CollectionError>
    where
        T: Clone,
    {
        self.next_element()
            .cloned()
            .ok_or(CollectionError::NoSuchElement)
    }

    /// Stop the iteration early; `has_next` is false from now on.
    pub fn close(&mut self) {
        self.cursor = ptr::null_mut();
    }
}

impl<T: Clone, G: Guard> Iterator for Iter<'_, T, G> {
    type Item = T;

    fn next(&mut self) -> Option<Self::Item> {
        self.next_element().cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::guard::DeferredGuard;

    type TestList = OrderedList<u32, DeferredGuard>;

    #[test]
    fn test_empty_iterator() {
        let list = TestList::new();
        let mut iter = list.iter();

        assert!(!iter.has_next());
        assert_eq!(iter.try_next(), Err(CollectionError::NoSuchElement));
        assert_eq!(iter.next(), None);
    }

    #[test]
    fn test_visits_each_element_once() {
        let list = TestList::new();
        for key in (0..100).rev() {
            list.insert(key);
        }

        let visited: Vec<u32> = list.iter().collect();
        assert_eq!(visited, (0..100).collect::<Vec<_>>());
    }

    #[test]
    fn test_has_next_is_idempotent() {
        let list = TestList::new();
        list.insert(1);

        let mut iter = list.iter();
        assert!(iter.has_next());
        assert!(iter.has_next());
        assert_eq!(iter.try_next(), Ok(1));
        assert!(!iter.has_next());
        assert_eq!(iter.try_next(), Err(CollectionError::NoSuchElement));
    }

    #[test]
    fn test_skips_elements_deleted_ahead_of_cursor() {
        let list = TestList::new();
        for key in 0..10 {
            list.insert(key);
        }

        let mut iter = list.iter();
        assert_eq!(iter.next(), Some(0));

        list.delete(&1);
        list.delete(&5);

        assert_eq!(iter.collect::<Vec<_>>(), vec![2, 3, 4, 6, 7, 8, 9]);
    }

    #[test]
    fn test_cursor_survives_deletion_of_its_node() {
        let list = TestList::new();
        for key in 0..5 {
            list.insert(key);
        }

        let mut iter = list.iter();
        assert_eq!(iter.next(), Some(0));

        // The cursor now sits on 1; unlink it and its successor.
        list.delete(&1);
        list.delete(&2);

        assert_eq!(iter.collect::<Vec<_>>(), vec![3, 4]);
    }

    #[test]
    fn test_independent_cursors() {
        let list = TestList::new();
        for key in 0..3 {
            list.insert(key);
        }

        let mut a = list.iter();
        let mut b = list.iter();
        assert_eq!(a.next(), Some(0));
        assert_eq!(a.next(), Some(1));
        assert_eq!(b.next(), Some(0));
        assert_eq!(a.next(), Some(2));
        assert_eq!(b.next(), Some(1));
    }

    #[test]
    fn test_close() {
        let list = TestList::new();
        list.insert(1);

        let mut iter = list.iter();
        iter.close();
        assert!(!iter.has_next());
    }
}
