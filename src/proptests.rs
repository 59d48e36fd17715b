use crate::index::FrequencyIndex;
use crate::ordered_map::OrderedMap;
use crate::prefix_map::PrefixMap;

use proptest::prelude::*;
use std::collections::BTreeMap;

/// Sort key matching the trie's child order: digits, then letters.
fn trie_order(word: &str) -> Vec<u8> {
    word.bytes()
        .map(|b| match b {
            b'0'..=b'9' => b - b'0',
            _ => b - b'a' + 10,
        })
        .collect()
}

/// AVL height bound for `n` nodes, in levels.
fn avl_level_bound(n: usize) -> f64 {
    1.4405 * ((n + 2) as f64).log2() - 0.3277
}

fn check_index(idx: &FrequencyIndex) {
    // Every stored word sits in exactly the bucket keyed by its count.
    for (word, count) in idx.words().iter() {
        for (key, bucket) in idx.buckets().iter() {
            assert_eq!(
                bucket.contains(&word),
                *key == count,
                "{word:?} (count {count}) vs bucket {key}"
            );
        }
        assert_eq!(idx.bucket(count).map(|b| b.occurrences(&word)), Some(count));
    }
    let bucketed: usize = idx.buckets().iter().map(|(_, b)| b.len()).sum();
    assert_eq!(bucketed, idx.distinct_words());
}

#[derive(Clone, Debug)]
enum Op {
    Insert(String, u64),
    Set(String, u64),
    Remove(String),
    Get(String),
}

fn word_strategy() -> impl Strategy<Value = String> + Clone {
    // Small alphabet so words collide and share prefixes.
    "[a-d0-2]{1,6}"
}

fn ops_strategy() -> impl Strategy<Value = Vec<Op>> {
    let word = word_strategy();
    let op = prop_oneof![
        45 => (word.clone(), 1u64..5).prop_map(|(w, n)| Op::Insert(w, n)),
        10 => (word.clone(), 1u64..50).prop_map(|(w, n)| Op::Set(w, n)),
        20 => word.clone().prop_map(Op::Remove),
        25 => word.clone().prop_map(Op::Get),
    ];
    prop::collection::vec(op, 0..=500)
}

proptest! {
    #![proptest_config(ProptestConfig {
        cases: 256,
        max_shrink_iters: 10_000,
        .. ProptestConfig::default()
    })]

    #[test]
    fn prop_prefix_map_equivalence(ops in ops_strategy()) {
        let mut t = PrefixMap::new();
        let mut m: BTreeMap<String, u64> = BTreeMap::new();

        for op in ops {
            match op {
                Op::Insert(w, n) => {
                    t.insert(&w, n).unwrap();
                    *m.entry(w).or_insert(0) += n;
                }
                Op::Set(w, n) => {
                    t.set_occurrences(&w, n).unwrap();
                    m.insert(w, n);
                }
                Op::Remove(w) => {
                    prop_assert_eq!(t.remove(&w), m.remove(&w));
                    prop_assert!(!t.contains(&w));
                }
                Op::Get(w) => {
                    prop_assert_eq!(t.occurrences(&w), m.get(&w).copied().unwrap_or(0));
                    prop_assert_eq!(t.contains(&w), m.contains_key(&w));
                }
            }
            prop_assert_eq!(t.len(), m.len());
        }

        let mut expected: Vec<(String, u64)> = m.into_iter().collect();
        expected.sort_by_key(|(w, _)| trie_order(w));
        prop_assert_eq!(t.to_word_list(), expected);
    }

    #[test]
    fn prop_ordered_map_equivalence(keys in prop::collection::vec(any::<i32>(), 0..=1000)) {
        let mut t = OrderedMap::new();
        let mut m = BTreeMap::new();

        for (i, k) in keys.into_iter().enumerate() {
            prop_assert_eq!(t.insert(k, i).unwrap(), m.insert(k, i));
        }

        t.validate();
        prop_assert_eq!(t.len(), m.len());
        if let Some(h) = t.height() {
            prop_assert!((h + 1) as f64 <= avl_level_bound(t.len()));
            prop_assert_eq!(t.min_key(), m.keys().next().unwrap());
            prop_assert_eq!(t.max_key(), m.keys().next_back().unwrap());
        }

        let got: Vec<(i32, usize)> = t.iter().map(|(k, v)| (*k, *v)).collect();
        let expected: Vec<(i32, usize)> = m.into_iter().collect();
        prop_assert!(got.windows(2).all(|w| w[0].0 < w[1].0));
        prop_assert_eq!(&got, &expected);

        let mut cursor = t.cursor();
        let mut again = Vec::new();
        while cursor.has_next() {
            cursor.advance();
            again.push((*cursor.key(), *cursor.value()));
        }
        prop_assert_eq!(again, got);
    }

    #[test]
    fn prop_index_buckets_track_counts(words in prop::collection::vec(word_strategy(), 0..=400)) {
        let mut idx = FrequencyIndex::new();
        let mut m: BTreeMap<String, u64> = BTreeMap::new();

        for w in &words {
            let count = idx.record(w).unwrap();
            let expected = m.entry(w.clone()).or_insert(0);
            *expected += 1;
            prop_assert_eq!(count, *expected);
        }

        check_index(&idx);
        prop_assert_eq!(idx.total_words(), words.len() as u64);
        for (w, c) in &m {
            prop_assert_eq!(idx.occurrences(w), *c);
        }

        let by_occ = idx.emit_by_occurrence();
        prop_assert!(by_occ.windows(2).all(|p| p[0].1 <= p[1].1));
        let mut expected: Vec<(String, u64)> = m.into_iter().collect();
        expected.sort_by(|a, b| a.1.cmp(&b.1).then_with(|| trie_order(&a.0).cmp(&trie_order(&b.0))));
        prop_assert_eq!(by_occ, expected);
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
    let keys = [1u64, 2, 3, 4, 5, 6, 7];

    for_each_permutation(&keys, |perm| {
        let mut t = OrderedMap::new();
        for &k in &perm {
            t.insert(k, ()).unwrap();
            t.validate();
        }
        let got: Vec<u64> = t.iter().map(|(k, _)| *k).collect();
        assert_eq!(got, keys.to_vec());
        assert!(t.height().unwrap() <= 3);
    });
}

#[test]
fn exhaustive_record_order_small_set() {
    let words = ["a", "a", "b", "ab", "b", "a"];

    for_each_permutation(&words, |perm| {
        let mut idx = FrequencyIndex::new();
        for w in perm {
            idx.record(w).unwrap();
        }
        check_index(&idx);
        assert_eq!(
            idx.emit_by_occurrence(),
            vec![
                ("ab".to_string(), 1),
                ("b".to_string(), 2),
                ("a".to_string(), 3),
            ]
        );
    });
}

#[test]
fn ascending_inserts_stay_logarithmic() {
    let mut t = OrderedMap::new();
    for k in 0..10_000u32 {
        t.insert(k, ()).unwrap();
    }
    t.validate();
    let h = t.height().unwrap();
    assert!((h + 1) as f64 <= avl_level_bound(t.len()), "height {h}");
}
