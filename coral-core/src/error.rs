//! Errors surfaced by coral collections.
//!
//! Contention never shows up here: a failed CAS is retried internally until the
//! operation completes. Only caller mistakes reach the caller.

use std::fmt;

/// Error returned by fallible collection operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CollectionError {
    /// The input was rejected before any traversal started.
    InvalidArgument(&'static str),
    /// A "must exist" accessor was called on an empty collection or an
    /// exhausted iterator.
    NoSuchElement,
}

impl fmt::Display for CollectionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CollectionError::InvalidArgument(reason) => write!(f, "invalid argument: {}", reason),
            CollectionError::NoSuchElement => write!(f, "no such element"),
        }
    }
}

impl std::error::Error for CollectionError {}
