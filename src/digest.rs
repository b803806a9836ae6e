//! Digest providers: the two independent hash functions that choose an
//! item's candidate buckets.

use core::hash::{BuildHasher, Hash};
use std::collections::hash_map::DefaultHasher;
use std::hash::BuildHasherDefault;

/// Supplies the primary and secondary digests of a value.
///
/// Both functions must be deterministic, and values that compare equal
/// (including a borrowed form and its owner, per the `Borrow` contract)
/// must produce equal digests. The two functions should be unrelated
/// algorithms so that a value's two candidate buckets rarely coincide.
pub trait DigestProvider {
    fn primary<T: ?Sized + Hash>(&self, value: &T) -> u64;
    fn secondary<T: ?Sized + Hash>(&self, value: &T) -> u64;
}

/// Any pair of `BuildHasher`s is a digest provider: the first builds the
/// primary digest, the second the secondary.
impl<A, B> DigestProvider for (A, B)
where
    A: BuildHasher,
    B: BuildHasher,
{
    #[inline]
    fn primary<T: ?Sized + Hash>(&self, value: &T) -> u64 {
        self.0.hash_one(value)
    }

    #[inline]
    fn secondary<T: ?Sized + Hash>(&self, value: &T) -> u64 {
        self.1.hash_one(value)
    }
}

// Fixed seeds keep the secondary digest stable across runs and processes.
const SECONDARY_SEEDS: [u64; 4] = [
    0x243f_6a88_85a3_08d3,
    0x1319_8a2e_0370_7344,
    0xa409_3822_299f_31d0,
    0x082e_fa98_ec4e_6c89,
];

/// Default provider: SipHash with fixed keys for the primary digest and
/// aHash with fixed seeds for the secondary one.
#[derive(Clone, Debug)]
pub struct DefaultDigests {
    primary: BuildHasherDefault<DefaultHasher>,
    secondary: ahash::RandomState,
}

impl DefaultDigests {
    pub fn new() -> Self {
        let [a, b, c, d] = SECONDARY_SEEDS;
        Self {
            primary: BuildHasherDefault::default(),
            secondary: ahash::RandomState::with_seeds(a, b, c, d),
        }
    }
}

impl Default for DefaultDigests {
    fn default() -> Self {
        Self::new()
    }
}

impl DigestProvider for DefaultDigests {
    #[inline]
    fn primary<T: ?Sized + Hash>(&self, value: &T) -> u64 {
        self.primary.hash_one(value)
    }

    #[inline]
    fn secondary<T: ?Sized + Hash>(&self, value: &T) -> u64 {
        self.secondary.hash_one(value)
    }
}

/// Both digests of one value. Cached in every occupied bucket so that
/// rehashing never calls back into `Hash`.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub struct Digests {
    pub primary: u64,
    pub secondary: u64,
}

impl Digests {
    #[inline]
    pub fn of<D, T>(provider: &D, value: &T) -> Self
    where
        D: DigestProvider,
        T: ?Sized + Hash,
    {
        Self {
            primary: provider.primary(value),
            secondary: provider.secondary(value),
        }
    }

    /// Primary and secondary candidate buckets for a table of `capacity`.
    #[inline]
    pub(crate) fn candidates(&self, capacity: usize) -> (usize, usize) {
        (
            bucket_index(self.primary, capacity),
            bucket_index(self.secondary, capacity),
        )
    }
}

/// `digest mod capacity`. Only meaningful for the capacity it was computed
/// against; indices never survive a resize.
#[inline]
pub(crate) fn bucket_index(digest: u64, capacity: usize) -> usize {
    debug_assert!(capacity > 0);
    (digest % capacity as u64) as usize
}
