use std::borrow::Borrow;
use std::collections::hash_map::RandomState;
use std::fmt;
use std::hash::{BuildHasher, Hash};

use crate::data_structures::concurrent_collection::ConcurrentCollection;
use crate::data_structures::hash::config::SplitOrderedConfig;
use crate::data_structures::hash::split_ordered_hash_map::{MapIter, SplitOrderedHashMap};
use crate::error::CollectionError;
use crate::guard::Guard;

/// Lock-free hash set: a [`SplitOrderedHashMap`] with unit values.
///
/// ```rust
/// use coral_core::DeferredGuard;
/// use coral_core::data_structures::SplitOrderedHashSet;
///
/// let set: SplitOrderedHashSet<&str, DeferredGuard> = SplitOrderedHashSet::new();
/// assert!(set.insert("a"));
/// assert!(!set.insert("a"));
/// assert!(set.contains("a"));
/// assert!(set.remove("a"));
/// assert!(set.is_empty());
/// ```
pub struct SplitOrderedHashSet<K, G: Guard, S = RandomState> {
    map: SplitOrderedHashMap<K, (), G, S>,
}

impl<K, G> SplitOrderedHashSet<K, G, RandomState>
where
    K: Hash + Ord,
    G: Guard,
{
    pub fn new() -> Self {
        SplitOrderedHashSet {
            map: SplitOrderedHashMap::new(),
        }
    }

    pub fn with_config(config: SplitOrderedConfig) -> Result<Self, CollectionError> {
        Ok(SplitOrderedHashSet {
            map: SplitOrderedHashMap::with_config(config)?,
        })
    }

    pub fn with_capacity(capacity: usize) -> Self {
        SplitOrderedHashSet {
            map: SplitOrderedHashMap::with_capacity(capacity),
        }
    }
}

impl<K, G> Default for SplitOrderedHashSet<K, G, RandomState>
where
    K: Hash + Ord,
    G: Guard,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<K, G, S> SplitOrderedHashSet<K, G, S>
where
    K: Hash + Ord,
    G: Guard,
    S: BuildHasher,
{
    pub fn with_hasher(hasher: S) -> Self {
        SplitOrderedHashSet {
            map: SplitOrderedHashMap::with_hasher(hasher),
        }
    }

    pub fn with_config_and_hasher(config: SplitOrderedConfig, hasher: S) -> Result<Self, CollectionError> {
        Ok(SplitOrderedHashSet {
            map: SplitOrderedHashMap::with_config_and_hasher(config, hasher)?,
        })
    }

    pub fn guard(&self) -> &G {
        self.map.guard()
    }

    /// Insert `key`. Returns false if it was already present.
    pub fn insert(&self, key: K) -> bool {
        self.map.insert(key, ())
    }

    /// Remove `key`. Returns true if this call removed it.
    pub fn remove<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: Hash + Ord + ?Sized,
    {
        self.map.delete(key)
    }

    pub fn contains<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: Hash + Ord + ?Sized,
    {
        self.map.contains_key(key)
    }

    /// Clone of the stored key equal to `key`.
    pub fn get<Q>(&self, key: &Q) -> Option<K>
    where
        K: Borrow<Q> + Clone,
        Q: Hash + Ord + ?Sized,
    {
        self.map.find_and_apply(key, |stored, _| stored.clone())
    }

    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    pub fn bucket_count(&self) -> u64 {
        self.map.bucket_count()
    }

    pub fn sentinel_count(&self) -> usize {
        self.map.sentinel_count()
    }

    /// Sentinels per live element. Stays at or below 2 with the default
    /// load factor.
    pub fn dummy_rate(&self) -> f64 {
        self.map.dummy_rate()
    }

    pub fn iter(&self) -> SetIter<'_, K, G> {
        SetIter {
            inner: self.map.iter(),
        }
    }
}

impl<K, G, S> fmt::Debug for SplitOrderedHashSet<K, G, S>
where
    K: Hash + Ord + fmt::Debug,
    G: Guard,
    S: BuildHasher,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut set = f.debug_set();
        let mut iter = self.map.iter();
        while let Some((key, _)) = iter.next_entry() {
            set.entry(key);
        }
        set.finish()
    }
}

impl<K, G, S> ConcurrentCollection<K> for SplitOrderedHashSet<K, G, S>
where
    K: Hash + Ord + Clone,
    G: Guard,
    S: BuildHasher,
{
    fn insert(&self, key: K) -> bool {
        SplitOrderedHashSet::insert(self, key)
    }

    fn delete(&self, key: &K) -> bool {
        SplitOrderedHashSet::remove(self, key)
    }

    fn contains(&self, key: &K) -> bool {
        SplitOrderedHashSet::contains(self, key)
    }

    fn len(&self) -> usize {
        SplitOrderedHashSet::len(self)
    }

    fn to_vec(&self) -> Vec<K> {
        self.iter().collect()
    }
}

/// Weakly consistent iterator over the keys of a [`SplitOrderedHashSet`].
pub struct SetIter<'a, K, G: Guard> {
    inner: MapIter<'a, K, (), G>,
}

impl<K, G: Guard> SetIter<'_, K, G> {
    pub fn has_next(&mut self) -> bool {
        self.inner.has_next()
    }

    /// Advance, failing with `NoSuchElement` once the set is exhausted.
    pub fn try_next(&mut self) -> Result<K, CollectionError>
    where
        K: Clone,
    {
        self.inner
            .next_entry()
            .map(|(key, _)| key.clone())
            .ok_or(CollectionError::NoSuchElement)
    }
}

impl<K: Clone, G: Guard> Iterator for SetIter<'_, K, G> {
    type Item = K;

    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next_entry().map(|(key, _)| key.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::guard::DeferredGuard;
    use std::collections::BTreeSet;

    type TestSet = SplitOrderedHashSet<String, DeferredGuard>;

    #[test]
    fn test_basic_set() {
        let set = TestSet::new();

        assert!(set.insert("x".to_string()));
        assert!(!set.insert("x".to_string()));
        assert!(set.contains("x"));
        assert_eq!(set.get("x"), Some("x".to_string()));
        assert_eq!(set.len(), 1);

        assert!(set.remove("x"));
        assert!(!set.remove("x"));
        assert!(!set.contains("x"));
        assert!(set.is_empty());
    }

    #[test]
    fn test_iter_and_try_next() {
        let set = TestSet::new();
        let mut iter = set.iter();
        assert!(!iter.has_next());
        assert_eq!(iter.try_next(), Err(CollectionError::NoSuchElement));

        for i in 0..50 {
            set.insert(format!("key {}", i));
        }

        let visited: BTreeSet<String> = set.iter().collect();
        let expected: BTreeSet<String> = (0..50).map(|i| format!("key {}", i)).collect();
        assert_eq!(visited, expected);
        assert_eq!(set.iter().count(), 50);
    }

    #[test]
    fn test_debug_format() {
        let set: SplitOrderedHashSet<u8, DeferredGuard> = SplitOrderedHashSet::new();
        set.insert(3);
        assert_eq!(format!("{:?}", set), "{3}");
    }

    #[test]
    fn test_collection_surface() {
        let set = TestSet::new();
        let keys: Vec<String> = (0..10).map(|i| i.to_string()).collect();

        assert!(set.insert_all(keys.clone()));
        assert!(!set.insert_all(keys.clone()));
        assert!(set.contains_all(&keys));

        assert!(set.retain_all(&keys[..5]));
        assert_eq!(ConcurrentCollection::len(&set), 5);
        assert!(set.contains_all(&keys[..5]));

        assert!(set.delete_all(&keys[..2]));
        assert!(!set.delete_all(&keys[..2]));

        set.clear();
        assert!(ConcurrentCollection::is_empty(&set));
    }
}
