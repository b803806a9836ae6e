//! BucketStore: fixed-length array of optional slots backing one table,
//! plus an overflow stash for items no bucket can hold.

use crate::digest::Digests;

/// An occupied bucket: the item plus the digests it was placed with.
#[derive(Clone, Debug)]
pub(crate) struct Slot<T> {
    pub(crate) digests: Digests,
    pub(crate) item: T,
}

impl<T> Slot<T> {
    pub(crate) fn new(digests: Digests, item: T) -> Self {
        Self { digests, item }
    }

    /// The bucket this slot would move to if displaced from `index`.
    ///
    /// When both candidates coincide this is `index` itself.
    #[inline]
    pub(crate) fn alternate(&self, index: usize, capacity: usize) -> usize {
        let (primary, secondary) = self.digests.candidates(capacity);
        if index == primary {
            secondary
        } else {
            debug_assert_eq!(index, secondary, "slot outside its candidate buckets");
            primary
        }
    }
}

pub(crate) type IntoSlots<T> = core::iter::Chain<
    core::iter::Flatten<std::vec::IntoIter<Option<Slot<T>>>>,
    std::vec::IntoIter<Slot<T>>,
>;

/// Owned bucket array with an occupied-count.
///
/// Indices `0..capacity` address buckets; `capacity + i` addresses stash
/// entry `i`. Indexing past the last stash entry panics.
#[derive(Clone, Debug)]
pub(crate) struct BucketStore<T> {
    buckets: Box<[Option<Slot<T>>]>,
    stash: Vec<Slot<T>>,
    len: usize,
}

impl<T> BucketStore<T> {
    pub(crate) fn new(capacity: usize) -> Self {
        Self {
            buckets: (0..capacity).map(|_| None).collect(),
            stash: Vec::new(),
            len: 0,
        }
    }

    #[inline]
    pub(crate) fn capacity(&self) -> usize {
        self.buckets.len()
    }

    #[inline]
    pub(crate) fn len(&self) -> usize {
        self.len
    }

    #[inline]
    pub(crate) fn get(&self, index: usize) -> Option<&Slot<T>> {
        match index.checked_sub(self.capacity()) {
            None => self.buckets[index].as_ref(),
            Some(i) => Some(&self.stash[i]),
        }
    }

    #[inline]
    pub(crate) fn get_mut(&mut self, index: usize) -> Option<&mut Slot<T>> {
        match index.checked_sub(self.capacity()) {
            None => self.buckets[index].as_mut(),
            Some(i) => Some(&mut self.stash[i]),
        }
    }

    #[inline]
    pub(crate) fn is_vacant(&self, index: usize) -> bool {
        self.get(index).is_none()
    }

    /// Number of addressable indices: every bucket plus every stash entry.
    #[inline]
    pub(crate) fn index_bound(&self) -> usize {
        self.capacity() + self.stash.len()
    }

    /// Fill an empty bucket.
    pub(crate) fn set(&mut self, index: usize, slot: Slot<T>) {
        let bucket = &mut self.buckets[index];
        assert!(bucket.is_none(), "set on occupied bucket {}", index);
        *bucket = Some(slot);
        self.len += 1;
    }

    /// Swap `slot` into an occupied bucket and return the evicted occupant.
    pub(crate) fn displace(&mut self, index: usize, slot: Slot<T>) -> Slot<T> {
        self.buckets[index]
            .replace(slot)
            .expect("displacement from an empty bucket")
    }

    /// Append `slot` to the overflow stash and return its index.
    pub(crate) fn stash(&mut self, slot: Slot<T>) -> usize {
        self.stash.push(slot);
        self.len += 1;
        self.index_bound() - 1
    }

    /// Empty a bucket or stash entry, returning its occupant if any.
    ///
    /// Taking a stash entry moves the last stash entry into its index.
    pub(crate) fn take(&mut self, index: usize) -> Option<Slot<T>> {
        let taken = match index.checked_sub(self.capacity()) {
            None => self.buckets[index].take(),
            Some(i) => Some(self.stash.swap_remove(i)),
        };
        if taken.is_some() {
            self.len -= 1;
        }
        taken
    }

    /// Occupied buckets in index order.
    #[cfg(test)]
    pub(crate) fn iter(&self) -> impl Iterator<Item = (usize, &Slot<T>)> {
        self.buckets
            .iter()
            .enumerate()
            .filter_map(|(i, b)| b.as_ref().map(|s| (i, s)))
    }

    pub(crate) fn buckets(&self) -> &[Option<Slot<T>>] {
        &self.buckets
    }

    pub(crate) fn stashed(&self) -> &[Slot<T>] {
        &self.stash
    }

    pub(crate) fn parts_mut(&mut self) -> (&mut [Option<Slot<T>>], &mut [Slot<T>]) {
        (&mut self.buckets, &mut self.stash)
    }

    pub(crate) fn into_slots(self) -> IntoSlots<T> {
        self.buckets
            .into_vec()
            .into_iter()
            .flatten()
            .chain(self.stash)
    }

    /// Checks that `len` matches occupancy and every bucketed slot sits in
    /// one of its candidate buckets.
    #[cfg(test)]
    pub(crate) fn check_invariants(&self) {
        let capacity = self.capacity();
        let mut occupied = self.stash.len();
        for (i, slot) in self.iter() {
            let (p, s) = slot.digests.candidates(capacity);
            assert!(
                i == p || i == s,
                "slot at {} has candidates ({}, {})",
                i,
                p,
                s
            );
            occupied += 1;
        }
        assert_eq!(occupied, self.len, "occupied count drifted");
    }
}
