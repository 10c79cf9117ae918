//! Tests for the ordered list surface, generic over the reclamation guard.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Barrier};
use std::thread;

use crate::data_structures::OrderedList;
use crate::error::CollectionError;
use crate::guard::Guard;

/// Test find returns a protected reference that outlives a concurrent delete
pub fn test_find_ref<G: Guard>() {
    let list: OrderedList<String, G> = OrderedList::new();
    list.insert("b".to_string());
    list.insert("a".to_string());

    let found = list.find(&"b".to_string()).unwrap();
    assert!(list.delete(&"b".to_string()));
    assert_eq!(found.as_str(), "b");
    drop(found);

    assert!(list.find(&"b".to_string()).is_none());
    assert_eq!(list.find_and_apply(&"a".to_string(), |s| s.len()), Some(1));
}

/// Test remove hands back the removed element
pub fn test_remove_returns_value<G: Guard>() {
    let list: OrderedList<i32, G> = OrderedList::new();
    for i in [3, 1, 2] {
        list.insert(i);
    }

    assert_eq!(list.remove(&2), Some(2));
    assert_eq!(list.remove(&2), None);
    assert_eq!(list.iter().collect::<Vec<_>>(), vec![1, 3]);
}

/// Test peek_first and the no-such-element path
pub fn test_peek_first<G: Guard>() {
    let list: OrderedList<i32, G> = OrderedList::new();
    assert_eq!(list.peek_first(), Err(CollectionError::NoSuchElement));

    for i in [8, 4, 6] {
        list.insert(i);
    }
    assert_eq!(list.peek_first(), Ok(4));

    list.delete(&4);
    assert_eq!(list.peek_first(), Ok(6));
}

/// Test index_of and get over live elements
pub fn test_positional_access<G: Guard>() {
    let list: OrderedList<i32, G> = OrderedList::new();
    for i in (0..20).rev() {
        list.insert(i * 10);
    }

    assert_eq!(list.index_of(&0), Some(0));
    assert_eq!(list.index_of(&190), Some(19));
    assert_eq!(list.index_of(&55), None);
    assert_eq!(list.get(5), Some(50));
    assert_eq!(list.get(20), None);

    list.delete(&0);
    assert_eq!(list.index_of(&190), Some(18));
    assert_eq!(list.get(0), Some(10));
}

/// Test an empty iterator fails with NoSuchElement
pub fn test_iterator_exhaustion<G: Guard>() {
    let list: OrderedList<i32, G> = OrderedList::new();
    let mut iter = list.iter();
    assert!(!iter.has_next());
    assert_eq!(iter.try_next(), Err(CollectionError::NoSuchElement));

    list.insert(1);
    let mut iter = list.iter();
    assert_eq!(iter.try_next(), Ok(1));
    assert_eq!(iter.try_next(), Err(CollectionError::NoSuchElement));
}

/// Iterators running alongside writers stay strictly ascending and never
/// drop a key that is present the whole time
pub fn test_weakly_consistent_iteration<G: Guard + 'static>() {
    let list: Arc<OrderedList<i32, G>> = Arc::new(OrderedList::new());
    let stop_flag = Arc::new(AtomicBool::new(false));

    for i in 0..300 {
        list.insert(i * 4);
    }

    let barrier = Arc::new(Barrier::new(3));
    let mut writers = vec![];
    for t in 0..2 {
        let list = Arc::clone(&list);
        let stop = Arc::clone(&stop_flag);
        let barrier = Arc::clone(&barrier);
        writers.push(thread::spawn(move || {
            barrier.wait();
            let mut i = 0;
            while !stop.load(Ordering::Relaxed) {
                let key = (i % 300) * 4 + 1 + t;
                list.insert(key);
                list.delete(&key);
                i += 1;
            }
        }));
    }

    barrier.wait();
    for _ in 0..100 {
        let visited: Vec<i32> = list.iter().collect();
        assert!(visited.windows(2).all(|w| w[0] < w[1]), "iteration out of order");
        assert_eq!(visited.iter().filter(|k| *k % 4 == 0).count(), 300);
    }

    stop_flag.store(true, Ordering::Relaxed);
    for writer in writers {
        writer.join().unwrap();
    }
}
