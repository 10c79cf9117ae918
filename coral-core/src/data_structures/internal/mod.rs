//! Internal implementation details.
//!
//! These are pub(crate) and not intended for external use.

pub mod marked_link;
pub mod order_probe;

pub(crate) use marked_link::MarkedLink;
pub(crate) use order_probe::OrderProbe;
