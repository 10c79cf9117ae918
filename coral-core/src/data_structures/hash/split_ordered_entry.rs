use std::borrow::Borrow;
use std::cmp::Ordering;

use crate::data_structures::internal::OrderProbe;

// Split-order keys.
//
// A regular key is the bit-reversed hash with the low bit set; a bucket key
// is the bit-reversed bucket index, whose low bit is clear for every bucket
// below 2^63.
//
//   bucket 0b0010 -> 0100...0000   (sentinel)
//   hash   ...0010 -> 0100...xxx1  (regular; sorts right after its sentinel)
//
// With `n` significant bucket bits, the top `n` bits of a regular key equal
// its bucket index reversed, so every regular node of bucket `b` (and of every
// bucket split off from `b`) sorts after b's sentinel and before the
// sentinel of the next bucket in split order.
//

#[inline]
pub(crate) fn regular_order_key(hash: u64) -> u64 {
    hash.reverse_bits() | 1
}

#[inline]
pub(crate) fn bucket_order_key(bucket: u64) -> u64 {
    bucket.reverse_bits() & !1
}

/// Bucket `b` with its highest set bit cleared; the bucket it was split from.
#[inline]
pub(crate) fn parent_bucket(bucket: u64) -> u64 {
    debug_assert!(bucket != 0, "bucket 0 has no parent");
    bucket & !(1u64 << (63 - bucket.leading_zeros()))
}

/// An element of the split-ordered list.
///
/// Buckets and regular entries never share an order key (their low bits
/// differ). Regular entries whose hashes collide on the order key are ordered
/// by the user key, so a collision is never mistaken for a duplicate.
///
pub enum SplitOrderedEntry<K, V> {
    Bucket { order_key: u64 },
    Regular { order_key: u64, key: K, value: V },
}

impl<K, V> SplitOrderedEntry<K, V> {
    pub(crate) fn bucket(bucket: u64) -> Self {
        SplitOrderedEntry::Bucket {
            order_key: bucket_order_key(bucket),
        }
    }

    pub(crate) fn regular(hash: u64, key: K, value: V) -> Self {
        SplitOrderedEntry::Regular {
            order_key: regular_order_key(hash),
            key,
            value,
        }
    }

    pub fn order_key(&self) -> u64 {
        match self {
            SplitOrderedEntry::Bucket { order_key } | SplitOrderedEntry::Regular { order_key, .. } => *order_key,
        }
    }

    pub fn is_bucket(&self) -> bool {
        matches!(self, SplitOrderedEntry::Bucket { .. })
    }

    pub fn key(&self) -> Option<&K> {
        match self {
            SplitOrderedEntry::Regular { key, .. } => Some(key),
            SplitOrderedEntry::Bucket { .. } => None,
        }
    }

    pub fn value(&self) -> Option<&V> {
        match self {
            SplitOrderedEntry::Regular { value, .. } => Some(value),
            SplitOrderedEntry::Bucket { .. } => None,
        }
    }

    pub fn key_value(&self) -> Option<(&K, &V)> {
        match self {
            SplitOrderedEntry::Regular { key, value, .. } => Some((key, value)),
            SplitOrderedEntry::Bucket { .. } => None,
        }
    }
}

impl<K: Ord, V> Ord for SplitOrderedEntry<K, V> {
    fn cmp(&self, other: &Self) -> Ordering {
        self.order_key()
            .cmp(&other.order_key())
            .then_with(|| match (self.key(), other.key()) {
                (Some(a), Some(b)) => a.cmp(b),
                (None, None) => Ordering::Equal,
                (None, Some(_)) => Ordering::Less,
                (Some(_), None) => Ordering::Greater,
            })
    }
}

impl<K: Ord, V> PartialOrd for SplitOrderedEntry<K, V> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl<K: Ord, V> PartialEq for SplitOrderedEntry<K, V> {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl<K: Ord, V> Eq for SplitOrderedEntry<K, V> {}

impl<K: std::fmt::Debug, V: std::fmt::Debug> std::fmt::Debug for SplitOrderedEntry<K, V> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SplitOrderedEntry::Bucket { order_key } => write!(f, "Bucket({:#018x})", order_key),
            SplitOrderedEntry::Regular { order_key, key, value } => {
                write!(f, "Regular({:#018x}, {:?} => {:?})", order_key, key, value)
            }
        }
    }
}

/// Probe for a regular entry, borrowing the user key.
pub(crate) struct RegularProbe<'a, Q: ?Sized> {
    pub order_key: u64,
    pub key: &'a Q,
}

impl<K, V, Q> OrderProbe<SplitOrderedEntry<K, V>> for RegularProbe<'_, Q>
where
    K: Borrow<Q>,
    Q: Ord + ?Sized,
{
    #[inline]
    fn compare_item(&self, item: &SplitOrderedEntry<K, V>) -> Ordering {
        match item {
            SplitOrderedEntry::Bucket { order_key } => order_key.cmp(&self.order_key).then(Ordering::Less),
            SplitOrderedEntry::Regular { order_key, key, .. } => order_key
                .cmp(&self.order_key)
                .then_with(|| <K as Borrow<Q>>::borrow(key).cmp(self.key)),
        }
    }
}
