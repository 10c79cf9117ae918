//! Test suites shared by every guard flavour.
//!
//! Each function is generic over the collection or guard type and is
//! instantiated from the `tests/` directories of coral-core and
//! coral-crossbeam.

pub mod ordered_list_tests;
