#![cfg(test)]

// Property tests for the set and map kept inside the crate so they can
// check bucket placement and occupied-count invariants after every step.

use crate::digest::{DefaultDigests, DigestProvider};
use crate::{CuckooMap, CuckooSet, InsertError};
use proptest::prelude::*;
use proptest::test_runner::TestCaseError;
use std::cell::Cell;
use std::collections::{BTreeSet, HashMap, HashSet};
use std::fmt;
use std::hash::Hash;

// Key newtype with Borrow<str> to exercise borrowed lookup.
#[derive(Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
struct Key(String);
impl fmt::Debug for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}
impl std::borrow::Borrow<str> for Key {
    fn borrow(&self) -> &str {
        &self.0
    }
}

// Primary digests land in four buckets at most, so nearly every insertion
// displaces something and long chains hit the bump ceiling.
#[derive(Clone, Default)]
struct Clumped(DefaultDigests);
impl DigestProvider for Clumped {
    fn primary<T: ?Sized + Hash>(&self, value: &T) -> u64 {
        self.0.primary(value) & 0x3
    }
    fn secondary<T: ?Sized + Hash>(&self, value: &T) -> u64 {
        self.0.secondary(value)
    }
}

// Every key gets the same pair of digests, so all but one key overflows.
#[derive(Clone, Default)]
struct Flat;
impl DigestProvider for Flat {
    fn primary<T: ?Sized + Hash>(&self, _value: &T) -> u64 {
        0
    }
    fn secondary<T: ?Sized + Hash>(&self, _value: &T) -> u64 {
        0
    }
}

// Two buckets between all keys, with the digest pair swapped for half of
// them. Distinct digests that no capacity can separate.
#[derive(Clone, Default)]
struct Paired(DefaultDigests);
impl DigestProvider for Paired {
    fn primary<T: ?Sized + Hash>(&self, value: &T) -> u64 {
        self.0.primary(value) & 1
    }
    fn secondary<T: ?Sized + Hash>(&self, value: &T) -> u64 {
        1 - (self.0.primary(value) & 1)
    }
}

// Pool-indexed operations to improve shrinking: indices shrink to earlier keys,
// pool length shrinks, and op lists shrink in length.
#[derive(Clone, Debug)]
enum OpI {
    Insert(usize, i32),
    TryInsert(usize, i32),
    GetOrInsertWith(usize, i32),
    Remove(usize),
    Get(usize),
    Contains(String),
    Mutate(usize, i32),
    Retain(bool),
    Snapshot,
    Clear,
    Iterate,
}

fn key_from(pool: &[String], i: usize) -> Key {
    Key(pool[i].clone())
}

fn arb_scenario() -> impl Strategy<Value = (Vec<String>, Vec<OpI>)> {
    proptest::collection::vec("[a-z]{0,5}", 1..=24).prop_flat_map(|pool| {
        let idxs: Vec<usize> = (0..pool.len()).collect();
        let idx = proptest::sample::select(idxs);
        let contains_pool = proptest::sample::select(pool.clone());
        let op = prop_oneof![
            4 => (idx.clone(), any::<i32>()).prop_map(|(i, v)| OpI::Insert(i, v)),
            2 => (idx.clone(), any::<i32>()).prop_map(|(i, v)| OpI::TryInsert(i, v)),
            2 => (idx.clone(), any::<i32>()).prop_map(|(i, v)| OpI::GetOrInsertWith(i, v)),
            2 => idx.clone().prop_map(OpI::Remove),
            2 => idx.clone().prop_map(OpI::Get),
            1 => prop_oneof![contains_pool, "[a-z]{0,5}"].prop_map(OpI::Contains),
            1 => (idx.clone(), any::<i32>()).prop_map(|(i, d)| OpI::Mutate(i, d)),
            1 => any::<bool>().prop_map(OpI::Retain),
            1 => Just(OpI::Snapshot),
            1 => Just(OpI::Clear),
            1 => Just(OpI::Iterate),
        ];
        proptest::collection::vec(op, 1..80).prop_map(move |ops| (pool.clone(), ops))
    })
}

fn even_len(k: &Key) -> bool {
    k.0.len() % 2 == 0
}

fn run_map_machine<D>(
    mut sut: CuckooMap<Key, i32, D>,
    pool: &[String],
    ops: Vec<OpI>,
) -> Result<(), TestCaseError>
where
    D: DigestProvider + Clone,
{
    let mut model: HashMap<Key, i32> = HashMap::new();
    // Clones taken at some point, paired with the model state at that time.
    let mut snapshots: Vec<(CuckooMap<Key, i32, D>, HashMap<Key, i32>)> = Vec::new();
    let default_calls = Cell::new(0);

    for op in ops {
        match op {
            OpI::Insert(i, v) => {
                let k = key_from(pool, i);
                prop_assert_eq!(sut.insert(k.clone(), v), model.insert(k, v));
            }
            OpI::TryInsert(i, v) => {
                let k = key_from(pool, i);
                let already = model.contains_key(&k);
                let cap = sut.capacity();
                match sut.try_insert(k.clone(), v) {
                    Ok(stored) => {
                        prop_assert!(!already, "try_insert must fail on duplicate");
                        prop_assert_eq!(*stored, v);
                        model.insert(k, v);
                    }
                    Err(InsertError::DuplicateKey) => {
                        prop_assert!(already, "duplicate error only when key exists");
                        prop_assert_eq!(sut.capacity(), cap, "duplicate must not resize");
                    }
                }
            }
            OpI::GetOrInsertWith(i, v) => {
                let k = key_from(pool, i);
                let already = model.contains_key(&k);
                let before = default_calls.get();
                let got = *sut.get_or_insert_with(k.clone(), || {
                    default_calls.set(default_calls.get() + 1);
                    v
                });
                let expected = *model.entry(k).or_insert(v);
                prop_assert_eq!(got, expected);
                let ran = default_calls.get() - before;
                prop_assert_eq!(ran, if already { 0 } else { 1 });
            }
            OpI::Remove(i) => {
                let k = key_from(pool, i);
                prop_assert_eq!(sut.remove(k.0.as_str()), model.remove(&k));
                prop_assert!(!sut.contains_key(&k));
            }
            OpI::Get(i) => {
                let k = key_from(pool, i);
                prop_assert_eq!(sut.get(&k), model.get(&k));
                prop_assert_eq!(
                    sut.get_key_value(k.0.as_str()),
                    model.get_key_value(&k)
                );
            }
            OpI::Contains(s) => {
                let has = sut.contains_key(s.as_str());
                let has_model = model.keys().any(|k| k.0 == s);
                prop_assert_eq!(has, has_model);
            }
            OpI::Mutate(i, d) => {
                let k = key_from(pool, i);
                match (sut.get_mut(&k), model.get_mut(&k)) {
                    (Some(s), Some(m)) => {
                        *s = s.saturating_add(d);
                        *m = m.saturating_add(d);
                    }
                    (None, None) => {}
                    (s, m) => prop_assert!(false, "presence mismatch: {:?} vs {:?}", s, m),
                }
            }
            OpI::Retain(keep_even) => {
                sut.retain(|k, _| even_len(k) == keep_even);
                model.retain(|k, _| even_len(k) == keep_even);
            }
            OpI::Snapshot => {
                let copy = sut.clone();
                prop_assert!(copy.shares_storage_with(&sut));
                snapshots.push((copy, model.clone()));
            }
            OpI::Clear => {
                sut.clear();
                model.clear();
                prop_assert_eq!(sut.capacity(), crate::DEFAULT_CAPACITY);
            }
            OpI::Iterate => {
                let s_keys: BTreeSet<_> = sut.keys().cloned().collect();
                let m_keys: BTreeSet<_> = model.keys().cloned().collect();
                prop_assert_eq!(s_keys, m_keys);
                prop_assert_eq!(sut.iter().len(), model.len());
            }
        }

        // Post-conditions after each op
        sut.check_invariants();
        prop_assert_eq!(sut.len(), model.len());
        prop_assert_eq!(sut.is_empty(), model.is_empty());
    }

    // Earlier clones never observe later mutations.
    for (copy, expected) in snapshots {
        copy.check_invariants();
        prop_assert_eq!(copy.len(), expected.len());
        for (k, v) in &expected {
            prop_assert_eq!(copy.get(k), Some(v));
        }
    }
    Ok(())
}

fn run_set_machine<D>(
    mut sut: CuckooSet<Key, D>,
    pool: &[String],
    ops: Vec<OpI>,
) -> Result<(), TestCaseError>
where
    D: DigestProvider + Clone,
{
    let mut model: HashSet<Key> = HashSet::new();
    let mut snapshots: Vec<(CuckooSet<Key, D>, HashSet<Key>)> = Vec::new();

    for op in ops {
        match op {
            OpI::Insert(i, _) | OpI::TryInsert(i, _) | OpI::GetOrInsertWith(i, _) => {
                let k = key_from(pool, i);
                let fresh = model.insert(k.clone());
                let cap = sut.capacity();
                let (inserted, stored) = sut.insert(k.clone());
                prop_assert_eq!(inserted, fresh);
                prop_assert_eq!(stored, &k);
                if !fresh {
                    prop_assert_eq!(sut.capacity(), cap, "duplicate must not resize");
                }
            }
            OpI::Remove(i) => {
                let k = key_from(pool, i);
                let expected = model.take(&k);
                prop_assert_eq!(sut.remove(k.0.as_str()), expected);
            }
            OpI::Get(i) | OpI::Mutate(i, _) => {
                let k = key_from(pool, i);
                prop_assert_eq!(sut.get(&k), model.get(&k));
            }
            OpI::Contains(s) => {
                prop_assert_eq!(sut.contains(s.as_str()), model.iter().any(|k| k.0 == s));
            }
            OpI::Retain(keep_even) => {
                sut.retain(|k| even_len(k) == keep_even);
                model.retain(|k| even_len(k) == keep_even);
            }
            OpI::Snapshot => {
                snapshots.push((sut.clone(), model.clone()));
            }
            OpI::Clear => {
                sut.clear();
                model.clear();
            }
            OpI::Iterate => {
                let seen: Vec<&Key> = sut.iter().collect();
                let unique: BTreeSet<&Key> = seen.iter().copied().collect();
                prop_assert_eq!(seen.len(), unique.len(), "iteration repeated an element");
                let m_keys: BTreeSet<&Key> = model.iter().collect();
                prop_assert_eq!(unique, m_keys);
            }
        }

        sut.check_invariants();
        prop_assert_eq!(sut.len(), model.len());
    }

    for (copy, expected) in snapshots {
        prop_assert_eq!(copy.len(), expected.len());
        prop_assert!(expected.iter().all(|k| copy.contains(k)));
    }
    Ok(())
}

// Property: State-machine equivalence against std::collections::HashMap.
// Invariants exercised across random operation sequences:
// - `insert` replaces and returns the previous value; `try_insert` rejects
//   duplicates without resizing; `get_or_insert_with` runs `default` only on
//   insertion.
// - Lookups through the owned key and its borrowed `str` agree with the model.
// - Every stored entry sits in one of its two candidate buckets, the occupied
//   count is exact, and the load factor never exceeds 1/2.
// - Clones taken mid-sequence are unaffected by later mutations.
proptest! {
    #![proptest_config(ProptestConfig { cases: 64, .. ProptestConfig::default() })]
    #[test]
    fn prop_map_state_machine((pool, ops) in arb_scenario()) {
        run_map_machine(CuckooMap::new(), &pool, ops)?;
    }

    // Same invariants with a tiny starting table, so growth happens early.
    #[test]
    fn prop_map_state_machine_small_start((pool, ops) in arb_scenario()) {
        run_map_machine(CuckooMap::with_capacity(2), &pool, ops)?;
    }

    // Same invariants under heavy primary-bucket collisions: exercises
    // displacement, abandoned chains, and growth mid-insert.
    #[test]
    fn prop_map_state_machine_with_collisions((pool, ops) in arb_scenario()) {
        run_map_machine(CuckooMap::with_digests(Clumped::default()), &pool, ops)?;
    }

    // Keys that no table size can tell apart: every operation reaches the
    // overflowed entries and growth stays bounded.
    #[test]
    fn prop_map_state_machine_inseparable((pool, ops) in arb_scenario()) {
        run_map_machine(CuckooMap::with_digests(Flat), &pool, ops.clone())?;
        run_map_machine(CuckooMap::with_capacity_and_digests(2, Paired::default()), &pool, ops)?;
    }
}

// Property: the set facade matches std::collections::HashSet, including
// under heavy collisions.
proptest! {
    #![proptest_config(ProptestConfig { cases: 64, .. ProptestConfig::default() })]
    #[test]
    fn prop_set_state_machine((pool, ops) in arb_scenario()) {
        run_set_machine(CuckooSet::new(), &pool, ops)?;
    }

    #[test]
    fn prop_set_state_machine_with_collisions((pool, ops) in arb_scenario()) {
        run_set_machine(CuckooSet::with_capacity_and_digests(2, Clumped::default()), &pool, ops)?;
    }

    #[test]
    fn prop_set_state_machine_inseparable((pool, ops) in arb_scenario()) {
        run_set_machine(CuckooSet::with_digests(Flat), &pool, ops.clone())?;
        run_set_machine(CuckooSet::with_capacity_and_digests(2, Paired::default()), &pool, ops)?;
    }
}
