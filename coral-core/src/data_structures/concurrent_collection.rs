/// Collection surface shared by the ordered list and the hash set.
///
/// Implementors provide the single-key operations; the bulk helpers below are
/// plain sequences of those operations. None of them is atomic as a whole: a
/// concurrent observer may see any prefix of a bulk call.
///
pub trait ConcurrentCollection<T> {
    /// Insert `key`. Returns false if it was already present.
    fn insert(&self, key: T) -> bool;

    /// Delete `key`. Returns true if this call removed it.
    fn delete(&self, key: &T) -> bool;

    fn contains(&self, key: &T) -> bool;

    /// Approximate number of elements while other threads mutate.
    fn len(&self) -> usize;

    /// Snapshot of the elements, weakly consistent.
    fn to_vec(&self) -> Vec<T>;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Remove every element by repeated single deletes.
    ///
    /// Elements inserted concurrently may survive.
    fn clear(&self) {
        loop {
            let snapshot = self.to_vec();
            if snapshot.is_empty() {
                return;
            }
            for key in &snapshot {
                self.delete(key);
            }
        }
    }

    /// Insert every key. Returns true if at least one insert succeeded.
    fn insert_all<I>(&self, keys: I) -> bool
    where
        I: IntoIterator<Item = T>,
        Self: Sized,
    {
        keys.into_iter()
            .fold(false, |changed, key| self.insert(key) | changed)
    }

    /// Delete every key. Returns true if at least one delete succeeded.
    fn delete_all<'a, I>(&self, keys: I) -> bool
    where
        I: IntoIterator<Item = &'a T>,
        T: 'a,
        Self: Sized,
    {
        keys.into_iter()
            .fold(false, |changed, key| self.delete(key) | changed)
    }

    /// Delete every element not in `keep`. Returns true if anything was deleted.
    fn retain_all(&self, keep: &[T]) -> bool
    where
        T: PartialEq,
    {
        let mut changed = false;
        for key in self.to_vec() {
            if !keep.contains(&key) && self.delete(&key) {
                changed = true;
            }
        }
        changed
    }

    fn contains_all<'a, I>(&self, keys: I) -> bool
    where
        I: IntoIterator<Item = &'a T>,
        T: 'a,
        Self: Sized,
    {
        keys.into_iter().all(|key| self.contains(key))
    }
}
