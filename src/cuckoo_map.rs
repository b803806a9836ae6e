//! CuckooMap: key-value facade over the placement engine. An entry's
//! placement identity is its key; values ride along in the same bucket.

use crate::digest::{DefaultDigests, DigestProvider, Digests};
use crate::error::InsertError;
use crate::raw::{self, RawCuckoo};
use core::fmt;
use core::hash::Hash;
use core::ops::Index;
use hashbrown::Equivalent;

/// Hash map whose entries live in one of two candidate buckets chosen by
/// the key's digests. Clones share storage until one side mutates.
pub struct CuckooMap<K, V, D = DefaultDigests> {
    raw: RawCuckoo<(K, V)>,
    digests: D,
}

impl<K, V> CuckooMap<K, V> {
    pub fn new() -> Self {
        Self::with_digests(DefaultDigests::new())
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self::with_capacity_and_digests(capacity, DefaultDigests::new())
    }
}

impl<K, V, D: Default> Default for CuckooMap<K, V, D> {
    fn default() -> Self {
        Self::with_digests(D::default())
    }
}

impl<K, V, D: Clone> Clone for CuckooMap<K, V, D> {
    fn clone(&self) -> Self {
        Self {
            raw: self.raw.clone(),
            digests: self.digests.clone(),
        }
    }
}

impl<K, V, D> CuckooMap<K, V, D> {
    pub fn with_digests(digests: D) -> Self {
        Self {
            raw: RawCuckoo::new(),
            digests,
        }
    }

    pub fn with_capacity_and_digests(capacity: usize, digests: D) -> Self {
        Self {
            raw: RawCuckoo::with_capacity(capacity),
            digests,
        }
    }

    pub fn len(&self) -> usize {
        self.raw.len()
    }
    pub fn is_empty(&self) -> bool {
        self.raw.is_empty()
    }
    pub fn capacity(&self) -> usize {
        self.raw.capacity()
    }

    pub fn digests(&self) -> &D {
        &self.digests
    }

    pub fn shares_storage_with(&self, other: &Self) -> bool {
        self.raw.shares_storage_with(&other.raw)
    }

    pub fn iter(&self) -> Iter<'_, K, V> {
        Iter {
            inner: self.raw.iter(),
        }
    }

    pub fn keys(&self) -> Keys<'_, K, V> {
        Keys { inner: self.iter() }
    }

    pub fn values(&self) -> Values<'_, K, V> {
        Values { inner: self.iter() }
    }

    /// Removes every entry and resets capacity to the default.
    pub fn clear(&mut self) {
        self.raw.clear();
    }

    #[cfg(test)]
    pub(crate) fn check_invariants(&self) {
        self.raw.check_invariants();
    }

    #[inline]
    fn entry_at(&self, index: usize) -> &(K, V) {
        self.raw
            .get(index)
            .expect("engine returned an empty bucket index")
    }
}

impl<K, V, D> CuckooMap<K, V, D>
where
    K: Hash + Eq,
    D: DigestProvider,
{
    fn find<Q>(&self, key: &Q) -> Option<usize>
    where
        Q: ?Sized + Hash + Equivalent<K>,
    {
        let digests = Digests::of(&self.digests, key);
        self.raw.find(digests, |entry| key.equivalent(&entry.0))
    }

    pub fn contains_key<Q>(&self, key: &Q) -> bool
    where
        Q: ?Sized + Hash + Equivalent<K>,
    {
        self.find(key).is_some()
    }

    pub fn get<Q>(&self, key: &Q) -> Option<&V>
    where
        Q: ?Sized + Hash + Equivalent<K>,
    {
        self.find(key).map(|i| &self.entry_at(i).1)
    }

    pub fn get_key_value<Q>(&self, key: &Q) -> Option<(&K, &V)>
    where
        Q: ?Sized + Hash + Equivalent<K>,
    {
        self.find(key).map(|i| {
            let (k, v) = self.entry_at(i);
            (k, v)
        })
    }
}

impl<K, V, D> CuckooMap<K, V, D>
where
    K: Hash + Eq + Clone,
    V: Clone,
    D: DigestProvider,
{
    #[inline]
    fn value_at_mut(&mut self, index: usize) -> &mut V {
        &mut self
            .raw
            .get_mut(index)
            .expect("engine returned an empty bucket index")
            .1
    }

    /// Inserts or updates `key`, returning the previous value if the key
    /// was present. An existing key keeps its original instance.
    pub fn insert(&mut self, key: K, value: V) -> Option<V> {
        let digests = Digests::of(&self.digests, &key);
        match self.raw.find(digests, |entry| entry.0 == key) {
            Some(index) => Some(core::mem::replace(self.value_at_mut(index), value)),
            None => {
                self.raw.insert_unique(digests, (key, value));
                None
            }
        }
    }

    /// Inserts a new entry; fails without touching the map if `key` exists.
    pub fn try_insert(&mut self, key: K, value: V) -> Result<&mut V, InsertError> {
        let digests = Digests::of(&self.digests, &key);
        if self.raw.find(digests, |entry| entry.0 == key).is_some() {
            return Err(InsertError::DuplicateKey);
        }
        let index = self.raw.insert_unique(digests, (key, value));
        Ok(self.value_at_mut(index))
    }

    /// Returns the value for `key`, inserting `default()` first if absent.
    /// `default` only runs when an insertion happens.
    pub fn get_or_insert_with<F>(&mut self, key: K, default: F) -> &mut V
    where
        F: FnOnce() -> V,
    {
        let digests = Digests::of(&self.digests, &key);
        let index = match self.raw.find(digests, |entry| entry.0 == key) {
            Some(index) => index,
            None => self.raw.insert_unique(digests, (key, default())),
        };
        self.value_at_mut(index)
    }

    pub fn get_mut<Q>(&mut self, key: &Q) -> Option<&mut V>
    where
        Q: ?Sized + Hash + Equivalent<K>,
    {
        let index = self.find(key)?;
        Some(self.value_at_mut(index))
    }

    pub fn remove_entry<Q>(&mut self, key: &Q) -> Option<(K, V)>
    where
        Q: ?Sized + Hash + Equivalent<K>,
    {
        let index = self.find(key)?;
        self.raw.remove(index)
    }

    pub fn remove<Q>(&mut self, key: &Q) -> Option<V>
    where
        Q: ?Sized + Hash + Equivalent<K>,
    {
        self.remove_entry(key).map(|(_, v)| v)
    }

    pub fn retain<F>(&mut self, mut f: F)
    where
        F: FnMut(&K, &mut V) -> bool,
    {
        self.raw.retain_mut(|(k, v)| f(k, v));
    }

    pub fn iter_mut(&mut self) -> IterMut<'_, K, V> {
        IterMut {
            inner: self.raw.iter_mut(),
        }
    }

    pub fn values_mut(&mut self) -> ValuesMut<'_, K, V> {
        ValuesMut {
            inner: self.iter_mut(),
        }
    }
}

impl<K, Q, V, D> Index<&Q> for CuckooMap<K, V, D>
where
    K: Hash + Eq,
    Q: ?Sized + Hash + Equivalent<K>,
    D: DigestProvider,
{
    type Output = V;

    /// Panics if `key` is absent.
    fn index(&self, key: &Q) -> &V {
        self.get(key).expect("key not found in CuckooMap")
    }
}

impl<K, V, D> PartialEq for CuckooMap<K, V, D>
where
    K: Hash + Eq,
    V: PartialEq,
    D: DigestProvider,
{
    fn eq(&self, other: &Self) -> bool {
        self.len() == other.len() && self.iter().all(|(k, v)| other.get(k) == Some(v))
    }
}

impl<K, V, D> Eq for CuckooMap<K, V, D>
where
    K: Hash + Eq,
    V: Eq,
    D: DigestProvider,
{
}

impl<K: fmt::Debug, V: fmt::Debug, D> fmt::Debug for CuckooMap<K, V, D> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.iter()).finish()
    }
}

impl<K, V, D> Extend<(K, V)> for CuckooMap<K, V, D>
where
    K: Hash + Eq + Clone,
    V: Clone,
    D: DigestProvider,
{
    fn extend<I: IntoIterator<Item = (K, V)>>(&mut self, iter: I) {
        for (k, v) in iter {
            self.insert(k, v);
        }
    }
}

impl<K, V, D> FromIterator<(K, V)> for CuckooMap<K, V, D>
where
    K: Hash + Eq + Clone,
    V: Clone,
    D: DigestProvider + Default,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut map = Self::default();
        map.extend(iter);
        map
    }
}

impl<K, V, const N: usize> From<[(K, V); N]> for CuckooMap<K, V>
where
    K: Hash + Eq + Clone,
    V: Clone,
{
    fn from(entries: [(K, V); N]) -> Self {
        entries.into_iter().collect()
    }
}

/// Iterator over `(&K, &V)` in bucket order.
pub struct Iter<'a, K, V> {
    inner: raw::Iter<'a, (K, V)>,
}

impl<K, V> Clone for Iter<'_, K, V> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

impl<'a, K, V> Iterator for Iter<'a, K, V> {
    type Item = (&'a K, &'a V);
    #[inline]
    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next().map(|(k, v)| (k, v))
    }
    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl<K, V> ExactSizeIterator for Iter<'_, K, V> {}

/// Iterator over `(&K, &mut V)` in bucket order.
pub struct IterMut<'a, K, V> {
    inner: raw::IterMut<'a, (K, V)>,
}

impl<'a, K, V> Iterator for IterMut<'a, K, V> {
    type Item = (&'a K, &'a mut V);
    #[inline]
    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next().map(|(k, v)| (&*k, v))
    }
    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl<K, V> ExactSizeIterator for IterMut<'_, K, V> {}

pub struct Keys<'a, K, V> {
    inner: Iter<'a, K, V>,
}

impl<'a, K, V> Iterator for Keys<'a, K, V> {
    type Item = &'a K;
    #[inline]
    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next().map(|(k, _)| k)
    }
    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl<K, V> ExactSizeIterator for Keys<'_, K, V> {}

pub struct Values<'a, K, V> {
    inner: Iter<'a, K, V>,
}

impl<'a, K, V> Iterator for Values<'a, K, V> {
    type Item = &'a V;
    #[inline]
    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next().map(|(_, v)| v)
    }
    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl<K, V> ExactSizeIterator for Values<'_, K, V> {}

pub struct ValuesMut<'a, K, V> {
    inner: IterMut<'a, K, V>,
}

impl<'a, K, V> Iterator for ValuesMut<'a, K, V> {
    type Item = &'a mut V;
    #[inline]
    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next().map(|(_, v)| v)
    }
    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl<K, V> ExactSizeIterator for ValuesMut<'_, K, V> {}

/// Owning iterator over `(K, V)` entries.
pub struct IntoIter<K, V> {
    inner: raw::IntoIter<(K, V)>,
}

impl<K, V> Iterator for IntoIter<K, V> {
    type Item = (K, V);
    #[inline]
    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next()
    }
    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl<K, V> ExactSizeIterator for IntoIter<K, V> {}

impl<'a, K, V, D> IntoIterator for &'a CuckooMap<K, V, D> {
    type Item = (&'a K, &'a V);
    type IntoIter = Iter<'a, K, V>;
    fn into_iter(self) -> Iter<'a, K, V> {
        self.iter()
    }
}

impl<K: Clone, V: Clone, D> IntoIterator for CuckooMap<K, V, D> {
    type Item = (K, V);
    type IntoIter = IntoIter<K, V>;
    fn into_iter(self) -> IntoIter<K, V> {
        IntoIter {
            inner: self.raw.into_iter(),
        }
    }
}
