//! Lock-free ordered list and its weakly consistent iterator.
//!
//! The list is parameterized by a guard type `G: Guard` that determines the
//! memory reclamation strategy:
//!
//! - `DeferredGuard`: Testing - defers destruction until the list drops
//! - `EpochGuard`: Production - epoch-based reclamation (coral-crossbeam)

pub mod ordered_list;
pub mod ordered_list_iter;

pub use ordered_list::{ListNode, OrderedList};
pub use ordered_list_iter::Iter;
