use std::cmp::Ordering;

/// A search key that can be compared against stored elements of type `T`.
///
/// Lets a traversal look for an element without first building a full `T`,
/// e.g. the hash map probes with `(order_key, &K)` instead of a whole entry.
///
pub(crate) trait OrderProbe<T: ?Sized> {
    /// Ordering of `item` relative to this probe (`item.cmp(probe)`).
    fn compare_item(&self, item: &T) -> Ordering;
}

impl<T: Ord> OrderProbe<T> for T {
    #[inline]
    fn compare_item(&self, item: &T) -> Ordering {
        item.cmp(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blanket_probe_matches_ord() {
        assert_eq!(5.compare_item(&3), Ordering::Less);
        assert_eq!(5.compare_item(&5), Ordering::Equal);
        assert_eq!(5.compare_item(&9), Ordering::Greater);
    }
}
