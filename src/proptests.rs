use super::*;

use proptest::prelude::*;
use proptest_derive::Arbitrary;
use std::collections::BTreeMap;
use std::ops::Bound;

/// Narrow keys so inserts, removes and seeks keep colliding.
#[derive(Clone, Debug, Arbitrary)]
enum Op {
    #[proptest(weight = 50)]
    Insert(#[proptest(strategy = "-300i16..300")] i16, u32),
    #[proptest(weight = 25)]
    Remove(#[proptest(strategy = "-300i16..300")] i16),
    #[proptest(weight = 20)]
    Get(#[proptest(strategy = "-300i16..300")] i16),
    #[proptest(weight = 4)]
    Seek(#[proptest(strategy = "-320i16..320")] i16, bool),
    #[proptest(weight = 1)]
    Compact,
}

/// Step a cursor seeked to `key` in one direction and compare with `BTreeMap`.
fn check_seek<K: CritBitKey, V: PartialEq + fmt::Debug>(
    t: &CritBitMap<K, V>,
    m: &BTreeMap<K, V>,
    key: K,
    forward: bool,
) -> std::result::Result<(), TestCaseError> {
    let mut cursor = t.cursor();
    cursor.seek(key);
    if forward {
        let mut expected = m.range(key..);
        for _ in 0..3 {
            let want = expected.next().map(|(k, v)| (*k, v));
            prop_assert_eq!(cursor.move_next(), want.is_some());
            prop_assert_eq!(cursor.entry(), want);
        }
    } else {
        let mut expected = m.range(..=key).rev();
        for _ in 0..3 {
            let want = expected.next().map(|(k, v)| (*k, v));
            prop_assert_eq!(cursor.move_prev(), want.is_some());
            prop_assert_eq!(cursor.entry(), want);
        }
    }
    Ok(())
}

fn ops_strategy_u64() -> impl Strategy<Value = Vec<(u8, u64, u64)>> {
    // (op selector, key, value) with keys spread across the full width.
    let key = prop_oneof![any::<u64>(), 0u64..64, (u64::MAX - 64)..=u64::MAX];
    prop::collection::vec((0u8..100, key, any::<u64>()), 0..=2000)
}

proptest! {
    #![proptest_config(ProptestConfig {
        cases: 256,
        max_shrink_iters: 50_000,
        .. ProptestConfig::default()
    })]

    #[test]
    fn prop_equivalence_i16(ops in prop::collection::vec(any::<Op>(), 0..=2000)) {
        let mut t: CritBitMap<i16, u32> = CritBitMap::new();
        let mut m: BTreeMap<i16, u32> = BTreeMap::new();

        for op in ops {
            match op {
                Op::Insert(key, value) => {
                    prop_assert_eq!(t.insert(key, value), m.insert(key, value));
                }
                Op::Remove(key) => {
                    prop_assert_eq!(t.remove(key), m.remove(&key));
                }
                Op::Get(key) => {
                    prop_assert_eq!(t.get(key), m.get(&key));
                    prop_assert_eq!(t.contains_key(key), m.contains_key(&key));
                }
                Op::Seek(key, forward) => {
                    check_seek(&t, &m, key, forward)?;
                }
                Op::Compact => {
                    t.compact();
                }
            }

            prop_assert_eq!(t.len(), m.len());
        }

        prop_assert!(t.validate().is_ok(), "{:?}", t.validate());
        let got: Vec<(i16, u32)> = t.iter().map(|(k, v)| (k, *v)).collect();
        let expected: Vec<(i16, u32)> = m.iter().map(|(k, v)| (*k, *v)).collect();
        prop_assert_eq!(got, expected);

        let got_rev: Vec<i16> = t.keys().rev().collect();
        let expected_rev: Vec<i16> = m.keys().rev().copied().collect();
        prop_assert_eq!(got_rev, expected_rev);
    }

    #[test]
    fn prop_equivalence_u64(ops in ops_strategy_u64()) {
        let mut t: CritBitMap<u64, u64> = CritBitMap::new();
        let mut m: BTreeMap<u64, u64> = BTreeMap::new();

        for (op, key, value) in ops {
            match op {
                0..=49 => {
                    prop_assert_eq!(t.insert(key, value), m.insert(key, value));
                }
                50..=74 => {
                    prop_assert_eq!(t.remove(key), m.remove(&key));
                }
                _ => {
                    prop_assert_eq!(t.get_cloned(key), m.get(&key).copied());
                }
            }
        }

        prop_assert_eq!(t.len(), m.len());
        prop_assert!(t.validate().is_ok(), "{:?}", t.validate());
        prop_assert!(t.depth() <= 64);
        prop_assert_eq!(
            t.first_key_value().map(|(k, v)| (k, *v)),
            m.first_key_value().map(|(k, v)| (*k, *v))
        );
        prop_assert_eq!(
            t.last_key_value().map(|(k, v)| (k, *v)),
            m.last_key_value().map(|(k, v)| (*k, *v))
        );
        let got: Vec<(u64, u64)> = t.iter().map(|(k, v)| (k, *v)).collect();
        let expected: Vec<(u64, u64)> = m.iter().map(|(k, v)| (*k, *v)).collect();
        prop_assert_eq!(got, expected);
    }

    #[test]
    fn prop_range_matches_btreemap(
        keys in prop::collection::btree_set(any::<i32>(), 0..200),
        lo in any::<i32>(),
        hi in any::<i32>(),
        lo_inclusive in any::<bool>(),
    ) {
        let t: CritBitMap<i32, ()> = keys.iter().map(|&k| (k, ())).collect();
        let (lo, hi) = (lo.min(hi), lo.max(hi));
        let start = if lo_inclusive { Bound::Included(lo) } else { Bound::Excluded(lo) };
        let got: Vec<i32> = t.range((start, Bound::Included(hi))).map(|(k, _)| k).collect();
        let expected: Vec<i32> = keys.range((start, Bound::Included(hi))).copied().collect();
        prop_assert_eq!(got, expected);
    }

    #[test]
    fn prop_cursor_round_trip(keys in prop::collection::btree_set(any::<u16>(), 1..300), pivot in any::<u16>()) {
        let t: CritBitMap<u16, u16> = keys.iter().map(|&k| (k, k)).collect();
        let mut cursor = t.cursor();

        // Walk to the end, then all the way back.
        let mut forward = Vec::new();
        while cursor.move_next() {
            forward.push(cursor.key().unwrap());
        }
        let mut backward = Vec::new();
        while cursor.move_prev() {
            backward.push(cursor.key().unwrap());
        }
        backward.reverse();
        let expected: Vec<u16> = keys.iter().copied().collect();
        prop_assert_eq!(&forward, &expected);
        prop_assert_eq!(&backward, &expected);

        // After a seek, the forward and backward neighbours bracket the pivot.
        cursor.seek(pivot);
        let next = cursor.move_next().then(|| cursor.key().unwrap());
        cursor.seek(pivot);
        let prev = cursor.move_prev().then(|| cursor.key().unwrap());
        prop_assert_eq!(next, keys.range(pivot..).next().copied());
        prop_assert_eq!(prev, keys.range(..=pivot).next_back().copied());
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

const SMALL_SET: [i8; 6] = [-128, -1, 0, 1, 64, 127];

#[test]
fn exhaustive_insert_order_small_set() {
    for_each_permutation(&SMALL_SET, |perm| {
        let mut t: CritBitMap<i8, usize> = CritBitMap::new();
        let mut m: BTreeMap<i8, usize> = BTreeMap::new();

        for (i, k) in perm.into_iter().enumerate() {
            assert_eq!(t.insert(k, i), m.insert(k, i));
        }

        t.validate().unwrap();
        let got: Vec<(i8, usize)> = t.iter().map(|(k, v)| (k, *v)).collect();
        let expected: Vec<(i8, usize)> = m.iter().map(|(k, v)| (*k, *v)).collect();
        assert_eq!(got, expected);
    });
}

#[test]
fn exhaustive_remove_order_small_set() {
    // Insert in a fixed order, then remove in all permutations.
    let mut base_tree: CritBitMap<i8, usize> = CritBitMap::new();
    let mut base_map: BTreeMap<i8, usize> = BTreeMap::new();
    for (i, &k) in SMALL_SET.iter().enumerate() {
        assert_eq!(base_tree.insert(k, i), base_map.insert(k, i));
    }

    for_each_permutation(&SMALL_SET, |perm| {
        let mut t = base_tree.clone();
        let mut m = base_map.clone();

        for k in perm {
            assert_eq!(t.remove(k), m.remove(&k));
            assert_eq!(t.len(), m.len());
            t.validate().unwrap();
            let keys: Vec<i8> = t.keys().collect();
            let expected: Vec<i8> = m.keys().copied().collect();
            assert_eq!(keys, expected);
        }
        assert_eq!(t.len(), 0);
        assert!(t.root.is_none());
    });
}
