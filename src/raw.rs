//! RawCuckoo: placement engine shared by the set and map facades.
//!
//! Items are stored with their two cached digests. Callers compute digests
//! and supply equality closures, so the engine itself never calls `Hash`
//! or `Eq` on the items it moves around.
//!
//! Items that growth cannot separate (for example three items with the
//! same digest pair) overflow into a small stash scanned after the two
//! candidate buckets.

use crate::bucket_store::{BucketStore, IntoSlots, Slot};
use crate::digest::{bucket_index, Digests};
use log::{debug, trace};
use std::sync::Arc;

/// Capacity of a table built with `new()` or reset with `clear()`.
pub const DEFAULT_CAPACITY: usize = 32;

/// Displacements allowed within one insertion before the table grows.
pub const MAX_BUMPS: usize = 20;

const MIN_CAPACITY: usize = 2;

// A chain that fails while capacity is at least this many times the item
// count is not a load problem; growing again would not help.
const SPARSE_FACTOR: usize = 8;

/// Rounds a requested capacity up to a power of two of at least 2.
pub(crate) fn normalize_capacity(requested: usize) -> usize {
    requested
        .max(MIN_CAPACITY)
        .checked_next_power_of_two()
        .expect("cuckoo table capacity overflow")
}

/// Whether inserting one more item would push the load factor past 1/2.
#[inline]
fn needs_grow(len: usize, capacity: usize) -> bool {
    (len + 1) * 2 > capacity
}

/// Outcome of a bump chain that hit `MAX_BUMPS`: the slot left without a
/// bucket, and where the inserted slot sits if it is not the homeless one.
struct Abandoned<T> {
    homeless: Slot<T>,
    new_at: Option<usize>,
}

/// Whether `homeless` should go to the stash rather than force a grow:
/// either the table is already sparse, or both of its candidate buckets
/// hold items with the very same digests.
fn should_stash<T>(store: &BucketStore<T>, homeless: &Slot<T>) -> bool {
    let capacity = store.capacity();
    if capacity >= SPARSE_FACTOR.saturating_mul(store.len() + 1) {
        return true;
    }
    let (primary, secondary) = homeless.digests.candidates(capacity);
    let twin = |index: usize| {
        store
            .get(index)
            .map_or(false, |s| s.digests == homeless.digests)
    };
    twin(primary) && twin(secondary)
}

/// Places `slot` into `store`, growing or stashing as needed, and returns
/// the index it ends up at. The index is valid until the next mutation.
fn place<T>(store: &mut BucketStore<T>, slot: Slot<T>) -> usize {
    let mut slot = slot;
    loop {
        if needs_grow(store.len(), store.capacity()) {
            grow(store);
        }
        let Abandoned { homeless, new_at } = match bump_chain(store, slot) {
            Ok(index) => return index,
            Err(abandoned) => abandoned,
        };
        if should_stash(store, &homeless) {
            let stashed = store.stash(homeless);
            trace!(
                "bump chain hit {} displacements at capacity {}; stashed ({} in stash)",
                MAX_BUMPS,
                store.capacity(),
                store.stashed().len()
            );
            return new_at.unwrap_or(stashed);
        }
        trace!(
            "bump chain hit {} displacements at capacity {}; growing",
            MAX_BUMPS,
            store.capacity()
        );
        match new_at {
            None => {
                grow(store);
                slot = homeless;
            }
            // The inserted slot comes out so it is placed last and its
            // index is the one returned.
            Some(index) => {
                let new = store.take(index).expect("inserted slot is in the table");
                grow(store);
                place(store, homeless);
                slot = new;
            }
        }
    }
}

/// Runs one displacement chain starting at the primary bucket of `slot`.
///
/// Tracks where the inserted slot currently sits, since a chain that
/// cycles can evict it again.
fn bump_chain<T>(store: &mut BucketStore<T>, slot: Slot<T>) -> Result<usize, Abandoned<T>> {
    let capacity = store.capacity();
    let mut index = bucket_index(slot.digests.primary, capacity);
    let mut pending = slot;
    let mut pending_is_new = true;
    let mut new_at: Option<usize> = None;

    for _ in 0..MAX_BUMPS {
        if store.is_vacant(index) {
            store.set(index, pending);
            if pending_is_new {
                return Ok(index);
            }
            return Ok(new_at.expect("inserted slot is in the table"));
        }
        let evicted = store.displace(index, pending);
        let evicted_is_new = new_at == Some(index);
        if pending_is_new {
            new_at = Some(index);
        }
        if evicted_is_new {
            new_at = None;
        }
        pending_is_new = evicted_is_new;
        index = evicted.alternate(index, capacity);
        pending = evicted;
    }

    Err(Abandoned {
        homeless: pending,
        new_at: if pending_is_new { None } else { new_at },
    })
}

/// Doubles capacity and rehashes every slot using its cached digests.
fn grow<T>(store: &mut BucketStore<T>) {
    let old_capacity = store.capacity();
    let new_capacity = old_capacity
        .checked_mul(2)
        .expect("cuckoo table capacity overflow");
    debug!(
        "growing cuckoo table from {} to {} buckets ({} occupied)",
        old_capacity,
        new_capacity,
        store.len()
    );
    let old = core::mem::replace(store, BucketStore::new(new_capacity));
    for slot in old.into_slots() {
        place(store, slot);
    }
}

/// Dual-hash table with displacement on collision and copy-on-write
/// storage. Cloning shares the bucket store; the first mutation through a
/// shared value duplicates it.
pub struct RawCuckoo<T> {
    store: Arc<BucketStore<T>>,
}

impl<T> Clone for RawCuckoo<T> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
        }
    }
}

impl<T> Default for RawCuckoo<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> RawCuckoo<T> {
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CAPACITY)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            store: Arc::new(BucketStore::new(normalize_capacity(capacity))),
        }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.store.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.store.len() == 0
    }

    #[inline]
    pub fn capacity(&self) -> usize {
        self.store.capacity()
    }

    /// Whether `other` shares this table's bucket store.
    pub fn shares_storage_with(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.store, &other.store)
    }

    /// Probes both candidate buckets, then the stash, for a slot whose
    /// cached digests equal `digests` and whose item satisfies `eq`.
    pub fn find(&self, digests: Digests, mut eq: impl FnMut(&T) -> bool) -> Option<usize> {
        let store = &*self.store;
        let (primary, secondary) = digests.candidates(store.capacity());
        let mut matches = |slot: Option<&Slot<T>>| {
            slot.map_or(false, |s| s.digests == digests && eq(&s.item))
        };
        if matches(store.get(primary)) {
            return Some(primary);
        }
        if secondary != primary && matches(store.get(secondary)) {
            return Some(secondary);
        }
        store
            .stashed()
            .iter()
            .position(|s| matches(Some(s)))
            .map(|i| store.capacity() + i)
    }

    #[inline]
    pub fn get(&self, index: usize) -> Option<&T> {
        self.store.get(index).map(|s| &s.item)
    }

    /// Drops every item and resets capacity to `DEFAULT_CAPACITY`.
    pub fn clear(&mut self) {
        self.store = Arc::new(BucketStore::new(DEFAULT_CAPACITY));
    }

    pub fn iter(&self) -> Iter<'_, T> {
        Iter {
            buckets: self.store.buckets().iter(),
            stash: self.store.stashed().iter(),
            remaining: self.len(),
        }
    }

    #[cfg(test)]
    pub(crate) fn stash_len(&self) -> usize {
        self.store.stashed().len()
    }

    #[cfg(test)]
    pub(crate) fn check_invariants(&self) {
        self.store.check_invariants();
        assert!(self.len() * 2 <= self.capacity(), "load factor above 1/2");
    }
}

impl<T: Clone> RawCuckoo<T> {
    /// Exclusive access to the store, duplicating it first if shared.
    #[inline]
    fn store_mut(&mut self) -> &mut BucketStore<T> {
        Arc::make_mut(&mut self.store)
    }

    #[inline]
    pub fn get_mut(&mut self, index: usize) -> Option<&mut T> {
        self.store_mut().get_mut(index).map(|s| &mut s.item)
    }

    /// Inserts an item known to be absent and returns its index.
    ///
    /// The caller is responsible for the duplicate check; `digests` must be
    /// the item's own digests.
    pub fn insert_unique(&mut self, digests: Digests, item: T) -> usize {
        let store = self.store_mut();
        let index = place(store, Slot::new(digests, item));
        debug_assert!(store.len() * 2 <= store.capacity());
        index
    }

    /// Empties bucket or stash entry `index`, returning its item.
    pub fn remove(&mut self, index: usize) -> Option<T> {
        if self.store.is_vacant(index) {
            return None;
        }
        self.store_mut().take(index).map(|s| s.item)
    }

    /// Keeps only the items for which `f` returns true. Storage is only
    /// duplicated when something is actually dropped.
    pub fn retain(&mut self, mut f: impl FnMut(&T) -> bool) {
        let store = &*self.store;
        let doomed: Vec<usize> = (0..store.index_bound())
            .filter(|&i| store.get(i).map_or(false, |s| !f(&s.item)))
            .collect();
        if doomed.is_empty() {
            return;
        }
        let store = self.store_mut();
        // Descending, so stash swap-removal only moves entries already kept.
        for index in doomed.into_iter().rev() {
            store.take(index);
        }
    }

    /// Like `retain`, but `f` may also update the items it keeps.
    pub fn retain_mut(&mut self, mut f: impl FnMut(&mut T) -> bool) {
        if self.is_empty() {
            return;
        }
        let store = self.store_mut();
        for index in (0..store.index_bound()).rev() {
            let keep = match store.get_mut(index) {
                Some(slot) => f(&mut slot.item),
                None => continue,
            };
            if !keep {
                store.take(index);
            }
        }
    }

    pub fn iter_mut(&mut self) -> IterMut<'_, T> {
        let remaining = self.len();
        let (buckets, stash) = self.store_mut().parts_mut();
        IterMut {
            buckets: buckets.iter_mut(),
            stash: stash.iter_mut(),
            remaining,
        }
    }
}

/// Moves the items out when the store is not shared, otherwise clones them.
impl<T: Clone> IntoIterator for RawCuckoo<T> {
    type Item = T;
    type IntoIter = IntoIter<T>;

    fn into_iter(self) -> IntoIter<T> {
        let remaining = self.len();
        let store = Arc::try_unwrap(self.store).unwrap_or_else(|shared| (*shared).clone());
        IntoIter {
            slots: store.into_slots(),
            remaining,
        }
    }
}

/// Occupied items in bucket-index order, then the stash.
pub struct Iter<'a, T> {
    buckets: core::slice::Iter<'a, Option<Slot<T>>>,
    stash: core::slice::Iter<'a, Slot<T>>,
    remaining: usize,
}

impl<T> Clone for Iter<'_, T> {
    fn clone(&self) -> Self {
        Self {
            buckets: self.buckets.clone(),
            stash: self.stash.clone(),
            remaining: self.remaining,
        }
    }
}

impl<'a, T> Iterator for Iter<'a, T> {
    type Item = &'a T;
    #[inline]
    fn next(&mut self) -> Option<Self::Item> {
        let slot = match self.buckets.by_ref().flatten().next() {
            Some(slot) => slot,
            None => self.stash.next()?,
        };
        let item = &slot.item;
        self.remaining -= 1;
        Some(item)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<T> ExactSizeIterator for Iter<'_, T> {}

/// Mutable access to occupied items in bucket-index order, then the stash.
pub struct IterMut<'a, T> {
    buckets: core::slice::IterMut<'a, Option<Slot<T>>>,
    stash: core::slice::IterMut<'a, Slot<T>>,
    remaining: usize,
}

impl<'a, T> Iterator for IterMut<'a, T> {
    type Item = &'a mut T;
    #[inline]
    fn next(&mut self) -> Option<Self::Item> {
        let slot = match self.buckets.by_ref().flatten().next() {
            Some(slot) => slot,
            None => self.stash.next()?,
        };
        let item = &mut slot.item;
        self.remaining -= 1;
        Some(item)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<T> ExactSizeIterator for IterMut<'_, T> {}

pub struct IntoIter<T> {
    slots: IntoSlots<T>,
    remaining: usize,
}

impl<T> Iterator for IntoIter<T> {
    type Item = T;
    #[inline]
    fn next(&mut self) -> Option<Self::Item> {
        let slot = self.slots.next()?;
        self.remaining -= 1;
        Some(slot.item)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<T> ExactSizeIterator for IntoIter<T> {}
