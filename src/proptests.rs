use super::*;

use proptest::prelude::*;
use proptest_derive::Arbitrary;
use std::collections::BTreeMap;

#[derive(Clone, Copy, Debug, Arbitrary)]
enum UpdaterKind {
    Assign,
    Add,
}

impl UpdaterKind {
    fn apply(self, slot: &mut u64, value: u64) {
        match self {
            UpdaterKind::Assign => assign(slot, value),
            UpdaterKind::Add => add(slot, value),
        }
    }
}

/// Model of the map: sequential `set` semantics over a `BTreeMap`.
fn model_set(m: &mut BTreeMap<String, u64>, key: &str, value: u64, kind: UpdaterKind) {
    match m.get_mut(key) {
        Some(slot) => kind.apply(slot, value),
        None => {
            m.insert(key.to_owned(), value);
        }
    }
}

fn validate_map(map: &LockfreeStrMap<u64>) {
    let mask = map.capacity() - 1;
    let mut prev: Option<(usize, String)> = None;
    let mut count = 0usize;
    map.for_each(|key, _| {
        let bucket = hash::key_hash(key.as_bytes()) as usize & mask;
        let cur = (bucket, key.to_owned());
        if let Some(p) = &prev {
            assert!(*p < cur, "entries out of bucket/key order: {:?} then {:?}", p, cur);
        }
        prev = Some(cur);
        count += 1;
    });
    assert_eq!(count, map.len(), "visited entries must match len");

    let stats = map.stats();
    assert_eq!(stats.keys, map.len());
    assert!(stats.occupied_buckets <= stats.buckets);
}

#[derive(Clone, Debug)]
enum Op {
    Set(String, u64, UpdaterKind),
    SetMany(Vec<(String, u64)>, UpdaterKind),
    Get(String),
}

fn key_strategy() -> impl Strategy<Value = String> + Clone {
    // Small alphabet so keys repeat and buckets fill up.
    "[a-d]{0,4}"
}

fn value_strategy() -> impl Strategy<Value = u64> + Clone {
    0u64..1_000_000
}

fn ops_strategy() -> impl Strategy<Value = Vec<Op>> {
    let key = key_strategy();
    let value = value_strategy();
    let op = prop_oneof![
        50 => (key.clone(), value.clone(), any::<UpdaterKind>())
            .prop_map(|(k, v, u)| Op::Set(k, v, u)),
        20 => (
            prop::collection::vec((key.clone(), value.clone()), 0..=16),
            any::<UpdaterKind>(),
        )
            .prop_map(|(items, u)| Op::SetMany(items, u)),
        30 => key.prop_map(Op::Get),
    ];
    prop::collection::vec(op, 0..=500)
}

proptest! {
    #![proptest_config(ProptestConfig {
        cases: 256,
        max_shrink_iters: 50_000,
        .. ProptestConfig::default()
    })]

    #[test]
    fn prop_equivalence(capacity in 0usize..=16, ops in ops_strategy()) {
        let map: LockfreeStrMap<u64> = LockfreeStrMap::new(capacity).unwrap();
        let mut m: BTreeMap<String, u64> = BTreeMap::new();

        for op in ops {
            match op {
                Op::Set(key, value, kind) => {
                    map.set(&key, value, |s, v| kind.apply(s, v)).unwrap();
                    model_set(&mut m, &key, value, kind);
                }
                Op::SetMany(items, kind) => {
                    for (key, value) in &items {
                        model_set(&mut m, key, *value, kind);
                    }
                    map.set_many(items, |s, v| kind.apply(s, v)).unwrap();
                }
                Op::Get(key) => {
                    prop_assert_eq!(map.get(&key), m.get(&key).copied());
                }
            }

            prop_assert_eq!(map.len(), m.len());
        }

        validate_map(&map);
        let mut got: Vec<(String, u64)> = map.iter().collect();
        got.sort();
        let expected: Vec<(String, u64)> = m.into_iter().collect();
        prop_assert_eq!(got, expected);
    }

    #[test]
    fn prop_batch_matches_sequential(
        capacity in 0usize..=8,
        seed in prop::collection::vec((key_strategy(), value_strategy()), 0..=32),
        batch in prop::collection::vec((key_strategy(), value_strategy()), 0..=64),
        kind in any::<UpdaterKind>(),
    ) {
        let batched: LockfreeStrMap<u64> = LockfreeStrMap::new(capacity).unwrap();
        let sequential: LockfreeStrMap<u64> = LockfreeStrMap::new(capacity).unwrap();
        for (key, value) in &seed {
            batched.insert(key, *value).unwrap();
            sequential.insert(key, *value).unwrap();
        }

        batched.set_many(batch.clone(), |s, v| kind.apply(s, v)).unwrap();
        for (key, value) in &batch {
            sequential.set(key, *value, |s, v| kind.apply(s, v)).unwrap();
        }

        validate_map(&batched);
        let got: Vec<(String, u64)> = batched.iter().collect();
        let expected: Vec<(String, u64)> = sequential.iter().collect();
        prop_assert_eq!(got, expected);
    }
}

fn for_each_permutation<T: Clone>(items: &[T], mut f: impl FnMut(Vec<T>)) {
    fn rec<T: Clone>(items: &[T], used: &mut [bool], out: &mut Vec<T>, f: &mut impl FnMut(Vec<T>)) {
        if out.len() == items.len() {
            f(out.clone());
            return;
        }
        for i in 0..items.len() {
            if used[i] {
                continue;
            }
            used[i] = true;
            out.push(items[i].clone());
            rec(items, used, out, f);
            out.pop();
            used[i] = false;
        }
    }

    let mut used = vec![false; items.len()];
    let mut out = Vec::with_capacity(items.len());
    rec(items, &mut used, &mut out, &mut f);
}

#[test]
fn exhaustive_insert_order_small_set() {
    let keys = ["a", "b", "c", "aa", "ab", "ba"];

    for_each_permutation(&keys, |perm| {
        let map: LockfreeStrMap<u64> = LockfreeStrMap::new(2).unwrap();
        let mut m: BTreeMap<String, u64> = BTreeMap::new();

        for (i, k) in perm.into_iter().enumerate() {
            let v = i as u64;
            map.insert(k, v).unwrap();
            m.insert(k.to_owned(), v);
        }

        validate_map(&map);
        let mut got: Vec<(String, u64)> = map.iter().collect();
        got.sort();
        let expected: Vec<(String, u64)> = m.into_iter().collect();
        assert_eq!(got, expected);
    });
}
