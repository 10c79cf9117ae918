//! Split-ordered hash collections.

pub(crate) mod bucket_directory;
pub mod config;
pub mod split_ordered_entry;
pub mod split_ordered_hash_map;
pub mod split_ordered_hash_set;

pub use config::SplitOrderedConfig;
pub use split_ordered_entry::SplitOrderedEntry;
pub use split_ordered_hash_map::{MapIter, SplitOrderedHashMap};
pub use split_ordered_hash_set::{SetIter, SplitOrderedHashSet};
