//! Set algebra for `CuckooSet`, built only on `insert` and `contains`.

use crate::cuckoo_set::CuckooSet;
use crate::digest::DigestProvider;
use core::hash::Hash;
use core::ops::{BitAnd, BitOr, BitXor, Sub};

impl<T, D> CuckooSet<T, D>
where
    T: Hash + Eq,
    D: DigestProvider,
{
    /// Every element of `self` is in `other`.
    pub fn is_subset(&self, other: &Self) -> bool {
        self.len() <= other.len() && self.iter().all(|v| other.contains(v))
    }

    pub fn is_superset(&self, other: &Self) -> bool {
        other.is_subset(self)
    }

    /// Subset of `other` and not equal to it.
    pub fn is_strict_subset(&self, other: &Self) -> bool {
        self.len() < other.len() && self.is_subset(other)
    }

    pub fn is_strict_superset(&self, other: &Self) -> bool {
        other.is_strict_subset(self)
    }

    pub fn is_disjoint(&self, other: &Self) -> bool {
        let (small, large) = if self.len() <= other.len() {
            (self, other)
        } else {
            (other, self)
        };
        small.iter().all(|v| !large.contains(v))
    }
}

impl<T, D> CuckooSet<T, D>
where
    T: Hash + Eq + Clone,
    D: DigestProvider + Clone,
{
    /// Elements in either set. Starts from a shared copy of the larger
    /// set, so no bucket store is duplicated unless something is added.
    pub fn union(&self, other: &Self) -> Self {
        let (small, large) = if self.len() <= other.len() {
            (self, other)
        } else {
            (other, self)
        };
        let mut out = large.clone();
        out.extend(small.iter().cloned());
        out
    }

    pub fn intersection(&self, other: &Self) -> Self {
        let (small, large) = if self.len() <= other.len() {
            (self, other)
        } else {
            (other, self)
        };
        let mut out = Self::with_digests(self.digests().clone());
        out.extend(small.iter().filter(|v| large.contains(*v)).cloned());
        out
    }

    /// Elements of `self` that are not in `other`.
    pub fn difference(&self, other: &Self) -> Self {
        let mut out = Self::with_digests(self.digests().clone());
        out.extend(self.iter().filter(|v| !other.contains(*v)).cloned());
        out
    }

    /// Elements in exactly one of the two sets.
    pub fn symmetric_difference(&self, other: &Self) -> Self {
        let mut out = self.difference(other);
        out.extend(other.iter().filter(|v| !self.contains(*v)).cloned());
        out
    }
}

impl<T, D> BitOr<&CuckooSet<T, D>> for &CuckooSet<T, D>
where
    T: Hash + Eq + Clone,
    D: DigestProvider + Clone,
{
    type Output = CuckooSet<T, D>;
    fn bitor(self, rhs: &CuckooSet<T, D>) -> CuckooSet<T, D> {
        self.union(rhs)
    }
}

impl<T, D> BitAnd<&CuckooSet<T, D>> for &CuckooSet<T, D>
where
    T: Hash + Eq + Clone,
    D: DigestProvider + Clone,
{
    type Output = CuckooSet<T, D>;
    fn bitand(self, rhs: &CuckooSet<T, D>) -> CuckooSet<T, D> {
        self.intersection(rhs)
    }
}

impl<T, D> Sub<&CuckooSet<T, D>> for &CuckooSet<T, D>
where
    T: Hash + Eq + Clone,
    D: DigestProvider + Clone,
{
    type Output = CuckooSet<T, D>;
    fn sub(self, rhs: &CuckooSet<T, D>) -> CuckooSet<T, D> {
        self.difference(rhs)
    }
}

impl<T, D> BitXor<&CuckooSet<T, D>> for &CuckooSet<T, D>
where
    T: Hash + Eq + Clone,
    D: DigestProvider + Clone,
{
    type Output = CuckooSet<T, D>;
    fn bitxor(self, rhs: &CuckooSet<T, D>) -> CuckooSet<T, D> {
        self.symmetric_difference(rhs)
    }
}
