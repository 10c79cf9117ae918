use std::borrow::Borrow;
use std::collections::hash_map::RandomState;
use std::fmt;
use std::hash::{BuildHasher, Hash};
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};

use crate::data_structures::hash::bucket_directory::BucketDirectory;
use crate::data_structures::hash::config::SplitOrderedConfig;
use crate::data_structures::hash::split_ordered_entry::{RegularProbe, SplitOrderedEntry, parent_bucket, regular_order_key};
use crate::data_structures::ordered::ordered_list::{ListNode, NodePtr, OrderedList};
use crate::data_structures::ordered::ordered_list_iter::Iter;
use crate::error::CollectionError;
use crate::guard::Guard;

type EntryPtr<K, V> = NodePtr<SplitOrderedEntry<K, V>>;

#[doc = r#"Lock-free split-ordered hash map on top of [`OrderedList`].

Based on Shalev and Shavit, "Split-Ordered Lists: Lock-Free Extensible Hash
Tables". Every element lives in one ordered list sorted by bit-reversed hash.
Buckets are entry points into that list, so growing the table never moves an
element.

# Buckets

Bucket `b` is a sentinel node whose order key is `reverse_bits(b)`; regular
entries use `reverse_bits(hash) | 1`. The sentinel of `b` therefore sorts
before every element hashing into `b` and into every bucket later split off
from `b`.

```text
parent(b) = b with its highest set bit cleared

Bucket 1: 0001 -> parent 0
Bucket 3: 0011 -> parent 1
Bucket 6: 0110 -> parent 2
Bucket 7: 0111 -> parent 3
```

# Lazy materialization

A sentinel is created on first access to its bucket. Its parent is ensured
first (recursively), the sentinel is linked into the list starting from the
parent's position, and its address is published into the directory with a
CAS. Threads racing on the same bucket link at most one sentinel: the losers
find the winner's node as a duplicate and publish the same address.

```text
8 buckets, split order:

HEAD(0) -> K(8) -> S4 -> K(4) -> S2 -> K(2) -> S6 -> S1 -> K(1) -> K(9) -> S5 -> S3 -> K(3) -> S7 -> null
```

# Growth

After an insert, if `len > max_load * bucket_count` the bucket count is
doubled with a single CAS. Nothing else changes: new buckets get their
sentinels the first time a key hashes into them.

# Reclamation

Removed entries are retired through `G`. Sentinels live until the map drops.
"#]
pub struct SplitOrderedHashMap<K, V, G: Guard, S = RandomState> {
    list: OrderedList<SplitOrderedEntry<K, V>, G>,
    directory: BucketDirectory<ListNode<SplitOrderedEntry<K, V>>>,
    size: AtomicUsize,
    bucket_count: AtomicU64,
    /// Sentinels linked so far, not counting the list head.
    sentinels: AtomicUsize,
    max_load: u64,
    max_buckets: u64,
    hasher: S,
}

impl<K, V, G> SplitOrderedHashMap<K, V, G, RandomState>
where
    K: Hash + Ord,
    G: Guard,
{
    pub fn new() -> Self {
        Self::with_hasher(RandomState::new())
    }

    pub fn with_config(config: SplitOrderedConfig) -> Result<Self, CollectionError> {
        Self::with_config_and_hasher(config, RandomState::new())
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self::from_parts(SplitOrderedConfig::with_capacity(capacity), RandomState::new())
    }
}

impl<K, V, G> Default for SplitOrderedHashMap<K, V, G, RandomState>
where
    K: Hash + Ord,
    G: Guard,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<K, V, G, S> SplitOrderedHashMap<K, V, G, S>
where
    K: Hash + Ord,
    G: Guard,
    S: BuildHasher,
{
    pub fn with_hasher(hasher: S) -> Self {
        Self::from_parts(SplitOrderedConfig::default(), hasher)
    }

    pub fn with_config_and_hasher(config: SplitOrderedConfig, hasher: S) -> Result<Self, CollectionError> {
        config.validate()?;
        Ok(Self::from_parts(config, hasher))
    }

    fn from_parts(config: SplitOrderedConfig, hasher: S) -> Self {
        let list = OrderedList::new();
        let directory = BucketDirectory::new();

        // Bucket 0 is the list head itself.
        directory.publish(0, list.head_node());

        SplitOrderedHashMap {
            list,
            directory,
            size: AtomicUsize::new(0),
            bucket_count: AtomicU64::new(config.initial_buckets),
            sentinels: AtomicUsize::new(0),
            max_load: config.max_load,
            max_buckets: config.max_buckets,
            hasher,
        }
    }

    /// The reclamation guard owned by this map.
    pub fn guard(&self) -> &G {
        self.list.guard()
    }

    #[inline]
    fn hash_key<Q>(&self, key: &Q) -> u64
    where
        Q: Hash + ?Sized,
    {
        self.hasher.hash_one(key)
    }

    // =========================================================================
    // Directory
    // =========================================================================

    /// Sentinel of `bucket`, materializing it and its ancestors on demand.
    ///
    /// Caller must hold a read guard.
    fn bucket_sentinel(&self, bucket: u64) -> EntryPtr<K, V> {
        let published = self.directory.get(bucket);
        if !published.is_null() {
            return published;
        }

        let parent = parent_bucket(bucket);
        let parent_sentinel = self.bucket_sentinel(parent);

        let sentinel = match self
            .list
            .insert_from(parent_sentinel, SplitOrderedEntry::bucket(bucket))
        {
            Ok(node) => {
                self.sentinels.fetch_add(1, Ordering::Relaxed);

                #[cfg(feature = "tracing")]
                tracing::trace!(bucket, parent, "materialized bucket sentinel");

                node
            }
            // Another thread linked it first; both publish the same node.
            Err(existing) => existing,
        };

        self.directory.publish(bucket, sentinel)
    }

    #[inline]
    fn sentinel_for_hash(&self, hash: u64) -> EntryPtr<K, V> {
        let bucket_count = self.bucket_count.load(Ordering::Acquire);
        self.bucket_sentinel(hash & (bucket_count - 1))
    }

    /// Double the bucket count if the average chain exceeds `max_load`.
    fn grow_if_overloaded(&self, size: usize) {
        let bucket_count = self.bucket_count.load(Ordering::Acquire);
        if bucket_count >= self.max_buckets || (size as u64) <= self.max_load.saturating_mul(bucket_count) {
            return;
        }

        // A lost race means someone else already doubled.
        if self
            .bucket_count
            .compare_exchange(bucket_count, bucket_count * 2, Ordering::AcqRel, Ordering::Relaxed)
            .is_ok()
        {
            #[cfg(feature = "tracing")]
            tracing::debug!(from = bucket_count, to = bucket_count * 2, len = size, "doubled bucket count");
        }
    }

    // =========================================================================
    // Operations
    // =========================================================================

    /// Insert `key -> value`. Returns false, dropping both, if `key` exists.
    pub fn insert(&self, key: K, value: V) -> bool {
        let _guard = G::pin();
        let hash = self.hash_key(&key);
        let sentinel = self.sentinel_for_hash(hash);

        match self
            .list
            .insert_from(sentinel, SplitOrderedEntry::regular(hash, key, value))
        {
            Ok(_) => {
                let size = self.size.fetch_add(1, Ordering::Relaxed) + 1;
                self.grow_if_overloaded(size);
                true
            }
            Err(_) => false,
        }
    }

    /// Remove `key`, returning a clone of its value.
    pub fn remove<Q>(&self, key: &Q) -> Option<V>
    where
        K: Borrow<Q>,
        Q: Hash + Ord + ?Sized,
        V: Clone,
    {
        self.remove_with(key, |entry| entry.value().cloned()).flatten()
    }

    /// Remove `key`. Returns true if this call removed it.
    pub fn delete<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: Hash + Ord + ?Sized,
    {
        self.remove_with(key, |_| ()).is_some()
    }

    fn remove_with<Q, R, F>(&self, key: &Q, take: F) -> Option<R>
    where
        K: Borrow<Q>,
        Q: Hash + Ord + ?Sized,
        F: FnOnce(&SplitOrderedEntry<K, V>) -> R,
    {
        let _guard = G::pin();
        let hash = self.hash_key(key);
        let sentinel = self.sentinel_for_hash(hash);
        let probe = RegularProbe {
            order_key: regular_order_key(hash),
            key,
        };

        let removed = self.list.delete_from(sentinel, &probe, take);
        if removed.is_some() {
            self.size.fetch_sub(1, Ordering::Relaxed);
        }
        removed
    }

    /// Node holding `key`. Caller must hold a read guard.
    fn find_entry<Q>(&self, key: &Q) -> Option<EntryPtr<K, V>>
    where
        K: Borrow<Q>,
        Q: Hash + Ord + ?Sized,
    {
        let hash = self.hash_key(key);
        let sentinel = self.sentinel_for_hash(hash);
        let probe = RegularProbe {
            order_key: regular_order_key(hash),
            key,
        };
        self.list.find_node_from(sentinel, &probe)
    }

    pub fn contains_key<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: Hash + Ord + ?Sized,
    {
        let _guard = G::pin();
        self.find_entry(key).is_some()
    }

    /// Protected reference to the value of `key`.
    pub fn get<Q>(&self, key: &Q) -> Option<G::GuardedRef<'_, V>>
    where
        K: Borrow<Q>,
        Q: Hash + Ord + ?Sized,
    {
        let _guard = G::pin();
        let node = self.find_entry(key)?;
        let value = unsafe { (*node).element() }.value()?;
        Some(unsafe { G::make_ref(value as *const V) })
    }

    pub fn get_cloned<Q>(&self, key: &Q) -> Option<V>
    where
        K: Borrow<Q>,
        Q: Hash + Ord + ?Sized,
        V: Clone,
    {
        self.find_and_apply(key, |_, value| value.clone())
    }

    /// Apply `f` to the entry of `key`, under protection.
    pub fn find_and_apply<Q, R, F>(&self, key: &Q, f: F) -> Option<R>
    where
        K: Borrow<Q>,
        Q: Hash + Ord + ?Sized,
        F: FnOnce(&K, &V) -> R,
    {
        let _guard = G::pin();
        let node = self.find_entry(key)?;
        let (key, value) = unsafe { (*node).element() }.key_value()?;
        Some(f(key, value))
    }

    /// Live element count. Approximate under concurrent mutation.
    pub fn len(&self) -> usize {
        self.size.load(Ordering::Relaxed)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Current logical bucket count, a power of two.
    pub fn bucket_count(&self) -> u64 {
        self.bucket_count.load(Ordering::Acquire)
    }

    /// Bucket sentinels linked so far, excluding the list head.
    pub fn sentinel_count(&self) -> usize {
        self.sentinels.load(Ordering::Relaxed)
    }

    /// Sentinels per live element; a tuning diagnostic.
    pub fn dummy_rate(&self) -> f64 {
        self.sentinel_count() as f64 / self.len().max(1) as f64
    }

    /// Weakly consistent iterator over `(key, value)` clones, in split order.
    pub fn iter(&self) -> MapIter<'_, K, V, G> {
        MapIter {
            inner: self.list.iter(),
        }
    }
}

impl<K, V, G, S> fmt::Debug for SplitOrderedHashMap<K, V, G, S>
where
    K: Hash + Ord + fmt::Debug,
    V: fmt::Debug,
    G: Guard,
    S: BuildHasher,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut map = f.debug_map();
        let mut iter = self.iter();
        while let Some((key, value)) = iter.next_entry() {
            map.entry(key, value);
        }
        map.finish()
    }
}

/// Weakly consistent iterator over the regular entries of a split-ordered
/// map; bucket sentinels are skipped.
pub struct MapIter<'a, K, V, G: Guard> {
    inner: Iter<'a, SplitOrderedEntry<K, V>, G>,
}

impl<K, V, G: Guard> MapIter<'_, K, V, G> {
    /// True if a live regular entry is reachable from the cursor.
    pub fn has_next(&mut self) -> bool {
        loop {
            let is_bucket = match self.inner.peek_element() {
                None => return false,
                Some(entry) => entry.is_bucket(),
            };
            if !is_bucket {
                return true;
            }
            self.inner.next_element();
        }
    }

    /// Advance and borrow the next regular entry.
    pub(crate) fn next_entry(&mut self) -> Option<(&K, &V)> {
        if !self.has_next() {
            return None;
        }
        self.inner.next_element().and_then(SplitOrderedEntry::key_value)
    }
}

impl<K: Clone, V: Clone, G: Guard> Iterator for MapIter<'_, K, V, G> {
    type Item = (K, V);

    fn next(&mut self) -> Option<Self::Item> {
        self.next_entry()
            .map(|(key, value)| (key.clone(), value.clone()))
    }
}
