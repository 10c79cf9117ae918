//! Lock-free ordered list and split-ordered hash collections.
//!
//! All collections are generic over a [`Guard`] that decides when removed
//! nodes are freed. [`DeferredGuard`] lives here for tests; the epoch based
//! guard is in `coral-crossbeam`.

pub mod common_tests;
pub mod data_structures;
pub mod error;
pub mod guard;

pub use data_structures::{ConcurrentCollection, OrderedList, SplitOrderedConfig, SplitOrderedHashMap, SplitOrderedHashSet};
pub use error::CollectionError;
pub use guard::{DeferredGuard, DeferredRef, Guard};

/*

cargo llvm-cov --html

cargo bench --package coral-crossbeam --bench hash_set_benchmark

*/
