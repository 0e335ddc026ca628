use std::{borrow::Borrow, collections::HashMap, hash::Hash};

/// HashMap with the SeaHash hasher, for hot lookups keyed by small values.
pub struct SeaMap<K, V>(HashMap<K, V, fasthash::sea::Hash64>);

impl<K, V> SeaMap<K, V>
where
    K: Eq + Hash,
{
    #[allow(clippy::new_without_default)]
    pub fn new() -> Self {
        SeaMap(HashMap::with_hasher(fasthash::sea::Hash64))
    }

    #[inline]
    pub fn contains_key<Q: ?Sized>(&self, k: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: Hash + Eq,
    {
        self.0.contains_key(k)
    }

    #[inline]
    pub fn get<Q: ?Sized>(&self, k: &Q) -> Option<&V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq,
    {
        self.0.get(k)
    }

    #[inline]
    pub fn insert(&mut self, k: K, v: V) -> Option<V> {
        self.0.insert(k, v)
    }

    #[inline]
    pub fn remove<Q: ?Sized>(&mut self, k: &Q) -> Option<V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq,
    {
        self.0.remove(k)
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.0.len()
    }
}

/// Multiset on top of [`SeaMap`]: how many times each key is currently held.
pub struct SeaCounter<K>(SeaMap<K, usize>);

impl<K> SeaCounter<K>
where
    K: Eq + Hash + Copy,
{
    #[allow(clippy::new_without_default)]
    pub fn new() -> Self {
        SeaCounter(SeaMap::new())
    }

    pub fn add(&mut self, k: K, n: usize) {
        if n == 0 {
            return;
        }
        let count = self.count(&k);
        self.0.insert(k, count + n);
    }

    /// Removes one occurrence. Returns false if `k` was not held.
    pub fn remove_one(&mut self, k: K) -> bool {
        match self.count(&k) {
            0 => false,
            1 => {
                self.0.remove(&k);
                true
            }
            n => {
                self.0.insert(k, n - 1);
                true
            }
        }
    }

    #[inline]
    pub fn count(&self, k: &K) -> usize {
        self.0.get(k).copied().unwrap_or(0)
    }

    #[inline]
    pub fn contains(&self, k: &K) -> bool {
        self.0.contains_key(k)
    }

    /// Number of distinct keys held.
    #[inline]
    pub fn distinct(&self) -> usize {
        self.0.len()
    }
}
