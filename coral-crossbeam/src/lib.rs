//! Epoch-based reclamation for coral collections.
//!
//! [`EpochGuard`] plugs crossbeam-epoch into the `Guard` seam of `coral-core`.
//! The aliases below are the collections most callers want:
//!
//! ```rust
//! use coral_crossbeam::LockFreeHashMap;
//!
//! let map: LockFreeHashMap<u64, &str> = LockFreeHashMap::new();
//! assert!(map.insert(1, "one"));
//! assert_eq!(map.get(&1).as_deref(), Some(&"one"));
//! assert_eq!(map.remove(&1), Some("one"));
//! ```

pub mod epoch_guard;

use std::collections::hash_map::RandomState;

use coral_core::data_structures::{OrderedList, SplitOrderedHashMap, SplitOrderedHashSet};

pub use epoch_guard::{EpochGuard, EpochRef};

pub type LockFreeOrderedList<T> = OrderedList<T, EpochGuard>;
pub type LockFreeHashSet<K, S = RandomState> = SplitOrderedHashSet<K, EpochGuard, S>;
pub type LockFreeHashMap<K, V, S = RandomState> = SplitOrderedHashMap<K, V, EpochGuard, S>;
