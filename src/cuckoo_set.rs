//! CuckooSet: unordered set facade over the placement engine.

use crate::digest::{DefaultDigests, DigestProvider, Digests};
use crate::raw::{self, RawCuckoo};
use core::fmt;
use core::hash::{Hash, Hasher};
use hashbrown::Equivalent;

/// Unordered set of unique elements, stored by cuckoo hashing.
///
/// Cloning is cheap: the clone shares the bucket store until either side
/// mutates. Mutating methods therefore require `T: Clone`.
pub struct CuckooSet<T, D = DefaultDigests> {
    raw: RawCuckoo<T>,
    digests: D,
}

impl<T> CuckooSet<T> {
    pub fn new() -> Self {
        Self::with_digests(DefaultDigests::new())
    }

    /// Capacity is rounded up to a power of two (at least 2).
    pub fn with_capacity(capacity: usize) -> Self {
        Self::with_capacity_and_digests(capacity, DefaultDigests::new())
    }
}

impl<T, D: Default> Default for CuckooSet<T, D> {
    fn default() -> Self {
        Self::with_digests(D::default())
    }
}

impl<T, D: Clone> Clone for CuckooSet<T, D> {
    fn clone(&self) -> Self {
        Self {
            raw: self.raw.clone(),
            digests: self.digests.clone(),
        }
    }
}

impl<T, D> CuckooSet<T, D> {
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

    /// Whether `other` still shares this set's storage (no copy taken yet).
    pub fn shares_storage_with(&self, other: &Self) -> bool {
        self.raw.shares_storage_with(&other.raw)
    }

    /// Elements in bucket order.
    pub fn iter(&self) -> Iter<'_, T> {
        Iter {
            inner: self.raw.iter(),
        }
    }

    /// Removes every element and resets capacity to the default.
    pub fn clear(&mut self) {
        self.raw.clear();
    }

    #[cfg(test)]
    pub(crate) fn check_invariants(&self) {
        self.raw.check_invariants();
    }

    #[inline]
    fn item_at(&self, index: usize) -> &T {
        self.raw
            .get(index)
            .expect("engine returned an empty bucket index")
    }
}

impl<T, D> CuckooSet<T, D>
where
    T: Hash + Eq,
    D: DigestProvider,
{
    fn find<Q>(&self, value: &Q) -> Option<usize>
    where
        Q: ?Sized + Hash + Equivalent<T>,
    {
        let digests = Digests::of(&self.digests, value);
        self.raw.find(digests, |item| value.equivalent(item))
    }

    pub fn contains<Q>(&self, value: &Q) -> bool
    where
        Q: ?Sized + Hash + Equivalent<T>,
    {
        self.find(value).is_some()
    }

    /// The stored element equal to `value`, if any.
    pub fn get<Q>(&self, value: &Q) -> Option<&T>
    where
        Q: ?Sized + Hash + Equivalent<T>,
    {
        self.find(value).map(|i| self.item_at(i))
    }
}

impl<T, D> CuckooSet<T, D>
where
    T: Hash + Eq + Clone,
    D: DigestProvider,
{
    /// Inserts `value` unless an equal element is present.
    ///
    /// Returns whether the value was inserted, and the element now stored:
    /// the new value, or the pre-existing one (in which case `value` is
    /// dropped and the set is unchanged).
    pub fn insert(&mut self, value: T) -> (bool, &T) {
        let digests = Digests::of(&self.digests, &value);
        if let Some(index) = self.raw.find(digests, |item| *item == value) {
            return (false, self.item_at(index));
        }
        let index = self.raw.insert_unique(digests, value);
        (true, self.item_at(index))
    }

    /// Inserts `value`, replacing and returning an equal element if present.
    pub fn replace(&mut self, value: T) -> Option<T> {
        let digests = Digests::of(&self.digests, &value);
        match self.raw.find(digests, |item| *item == value) {
            Some(index) => self
                .raw
                .get_mut(index)
                .map(|slot| core::mem::replace(slot, value)),
            None => {
                self.raw.insert_unique(digests, value);
                None
            }
        }
    }

    /// Removes and returns the element equal to `value`.
    pub fn remove<Q>(&mut self, value: &Q) -> Option<T>
    where
        Q: ?Sized + Hash + Equivalent<T>,
    {
        let index = self.find(value)?;
        self.raw.remove(index)
    }

    /// Keeps only the elements for which `f` returns true. A shared set is
    /// only copied if some element is dropped.
    pub fn retain<F>(&mut self, mut f: F)
    where
        F: FnMut(&T) -> bool,
    {
        self.raw.retain(|item| f(item));
    }
}

impl<T, D> PartialEq for CuckooSet<T, D>
where
    T: Hash + Eq,
    D: DigestProvider,
{
    fn eq(&self, other: &Self) -> bool {
        self.len() == other.len() && self.iter().all(|v| other.contains(v))
    }
}

impl<T, D> Eq for CuckooSet<T, D>
where
    T: Hash + Eq,
    D: DigestProvider,
{
}

/// Order-independent: element digests are summed, so equal sets hash
/// equally whatever their bucket layout or capacity.
impl<T, D> Hash for CuckooSet<T, D>
where
    T: Hash,
{
    fn hash<H: Hasher>(&self, state: &mut H) {
        let digests = DefaultDigests::new();
        let combined = self
            .iter()
            .fold(0u64, |acc, v| acc.wrapping_add(digests.primary(v)));
        state.write_usize(self.len());
        state.write_u64(combined);
    }
}

impl<T: fmt::Debug, D> fmt::Debug for CuckooSet<T, D> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.iter()).finish()
    }
}

impl<T, D> Extend<T> for CuckooSet<T, D>
where
    T: Hash + Eq + Clone,
    D: DigestProvider,
{
    fn extend<I: IntoIterator<Item = T>>(&mut self, iter: I) {
        for v in iter {
            self.insert(v);
        }
    }
}

impl<'a, T, D> Extend<&'a T> for CuckooSet<T, D>
where
    T: Hash + Eq + Copy + 'a,
    D: DigestProvider,
{
    fn extend<I: IntoIterator<Item = &'a T>>(&mut self, iter: I) {
        self.extend(iter.into_iter().copied());
    }
}

impl<T, D> FromIterator<T> for CuckooSet<T, D>
where
    T: Hash + Eq + Clone,
    D: DigestProvider + Default,
{
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        let mut set = Self::default();
        set.extend(iter);
        set
    }
}

impl<T, const N: usize> From<[T; N]> for CuckooSet<T>
where
    T: Hash + Eq + Clone,
{
    fn from(values: [T; N]) -> Self {
        values.into_iter().collect()
    }
}

/// Iterator over set elements in bucket order.
pub struct Iter<'a, T> {
    inner: raw::Iter<'a, T>,
}

impl<T> Clone for Iter<'_, T> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

impl<'a, T> Iterator for Iter<'a, T> {
    type Item = &'a T;
    #[inline]
    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next()
    }
    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl<T> ExactSizeIterator for Iter<'_, T> {}

/// Owning iterator over set elements.
pub struct IntoIter<T> {
    inner: raw::IntoIter<T>,
}

impl<T> Iterator for IntoIter<T> {
    type Item = T;
    #[inline]
    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next()
    }
    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl<T> ExactSizeIterator for IntoIter<T> {}

impl<'a, T, D> IntoIterator for &'a CuckooSet<T, D> {
    type Item = &'a T;
    type IntoIter = Iter<'a, T>;
    fn into_iter(self) -> Iter<'a, T> {
        self.iter()
    }
}

impl<T: Clone, D> IntoIterator for CuckooSet<T, D> {
    type Item = T;
    type IntoIter = IntoIter<T>;
    fn into_iter(self) -> IntoIter<T> {
        IntoIter {
            inner: self.raw.into_iter(),
        }
    }
}
