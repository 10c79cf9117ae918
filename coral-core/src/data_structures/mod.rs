//! Data structures for concurrent collections.
//!
//! # Organization
//!
//! - [`ordered`] - Lock-free ordered list and its weakly consistent iterator
//! - [`hash`] - Split-ordered hash map and set built on the ordered list
//! - [`internal`] - Internal implementation details (pub(crate))

// Submodules
pub mod hash;
pub(crate) mod internal;
pub mod ordered;

// Top-level public modules
pub mod concurrent_collection;

pub use concurrent_collection::ConcurrentCollection;
pub use hash::{MapIter, SetIter, SplitOrderedConfig, SplitOrderedEntry, SplitOrderedHashMap, SplitOrderedHashSet};
pub use ordered::{Iter, OrderedList};
