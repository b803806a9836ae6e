//! cuckoo-collections: a set and a map built on cuckoo hashing, with
//! copy-on-write storage shared between clones.
//!
//! Internal Design:
//!
//! Summary
//! - Goal: one placement engine, two thin facades. Every item lives in
//!   one of exactly two candidate buckets chosen by two independent
//!   digests; collisions displace the occupant to its other bucket instead
//!   of probing.
//! - Layers:
//!   - `DigestProvider`: two deterministic 64-bit hash functions. The
//!     default pairs SipHash (fixed keys) with aHash (fixed seeds); any
//!     pair of `BuildHasher`s also works.
//!   - `BucketStore<T>`: fixed-length array of optional slots, an
//!     overflow stash, and an occupied-count covering both. Each slot
//!     caches the digests its item was placed with.
//!   - `RawCuckoo<T>`: placement, displacement chains, growth, lookup,
//!     removal, iteration, copy-on-write.
//!   - `CuckooSet<T, D>` and `CuckooMap<K, V, D>`: public API. The set's
//!     item is the element; the map's item is `(K, V)` identified by `K`.
//!
//! Constraints
//! - Load factor stays at or below 1/2: an insertion that would exceed it
//!   doubles capacity first. Capacity never shrinks except via `clear()`,
//!   which resets it to `DEFAULT_CAPACITY`.
//! - Every item sits at `primary % capacity` or `secondary % capacity`,
//!   or in the stash.
//! - Lookups and removals probe at most two buckets, then scan the stash.
//! - A bump chain is cut after `MAX_BUMPS` displacements. The item still
//!   in hand goes to the stash when the table is already sparse (capacity
//!   at least 8 times the item count) or when both of its candidate
//!   buckets hold items with the very same digests; otherwise the table
//!   doubles and the item is placed again. Items that no capacity can
//!   separate (equal digests, or digests that differ only where `%
//!   capacity` never looks) therefore cost stash entries, not memory:
//!   capacity stays below `16 * (len + 1)`.
//! - Stash entries count toward `len` and the load bound. Growth gives
//!   each of them another chance at a bucket.
//!
//! Equality policy
//! - Two items are the same logical item iff both digests match AND they
//!   compare equal (`Eq`, or `Equivalent` for borrowed queries). Matching
//!   digests alone never make a duplicate or a removal hit.
//!
//! Hasher and rehashing invariants
//! - Digests are computed once, on insertion, and cached in the slot.
//!   Growth rehashes from the cached digests; `Hash` is never invoked on
//!   a stored item after insertion.
//!
//! Copy-on-write
//! - Storage sits behind an `Arc`. `clone()` shares it; the first
//!   mutating call on a shared value duplicates it (`Arc::make_mut`), so a
//!   clone never observes another value's mutations. Mutating methods
//!   therefore require `T: Clone` (`K: Clone, V: Clone` for the map).
//!
//! Errors
//! - Expected negatives are ordinary results: duplicate insert returns
//!   `(false, &existing)` or `Err(InsertError::DuplicateKey)`; absent
//!   lookups and removals return `None`.
//! - Internal invariant violations (out-of-range bucket, displacing from
//!   an empty bucket, capacity overflow) panic.
//!
//! Logging
//! - Growth is reported through the `log` facade at `debug` level, chain
//!   cut-offs at `trace` level. The crate never installs a logger.
//!
//! Notes and non-goals
//! - No concurrent mutation of one value; values are `Send`/`Sync` when
//!   their items are.
//! - No persistence, no shrinking on removal.

mod bucket_store;
mod cuckoo_map;
mod cuckoo_set;
pub mod digest;
mod error;
mod raw;
mod set_ops;

#[cfg(test)]
mod cuckoo_proptest;

// Public surface
pub use cuckoo_map::CuckooMap;
pub use cuckoo_set::CuckooSet;
pub use digest::{DefaultDigests, DigestProvider, Digests};
pub use error::InsertError;
pub use raw::{DEFAULT_CAPACITY, MAX_BUMPS};

/// Iterator types for `CuckooSet`.
pub mod set {
    pub use crate::cuckoo_set::{IntoIter, Iter};
}

/// Iterator types for `CuckooMap`.
pub mod map {
    pub use crate::cuckoo_map::{IntoIter, Iter, IterMut, Keys, Values, ValuesMut};
}

// Internal benchmarking hook: exposes the placement engine for benches only.
#[cfg(feature = "bench_internal")]
pub use raw::RawCuckoo;
