// OpenAddressingTable property tests over the public surface.
//
// Property 1: growth sizing.
//  - Model: starting from size s, the table ends at the smallest s * 2^k
//    with n / (s * 2^k) <= t after n distinct inserts under threshold t.
//  - Invariant: every inserted key still maps to its value afterwards.
//
// Property 2: absence.
//  - Keys from a disjoint alphabet never resolve, before or after deletes.
//
// Property 3: delete then absent.
//  - Deleting a subset removes exactly that subset; the rest survive and
//    `used` drops by the subset size.
use probe_table::{HashOptions, OpenAddressingTable, ProbeStrategy};
use proptest::prelude::*;
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::collections::BTreeSet;

fn arb_strategy() -> impl Strategy<Value = ProbeStrategy> {
    prop_oneof![
        Just(ProbeStrategy::Linear),
        Just(ProbeStrategy::Quadratic),
        Just(ProbeStrategy::DoubleHash),
    ]
}

fn expected_size(n: usize, mut size: usize, threshold: f64) -> usize {
    while n as f64 / size as f64 > threshold {
        size *= 2;
    }
    size
}

// Property 1: final size follows the doubling rule.
proptest! {
    #[test]
    fn prop_growth_sizing(
        keys in proptest::collection::btree_set("[a-z0-9]{1,10}", 0..300),
        exp in 0u32..6,
        threshold in prop_oneof![Just(0.25f64), Just(0.5), Just(0.65), Just(0.9), Just(1.0)],
        strategy in arb_strategy(),
        seed in any::<u64>(),
    ) {
        let initial = 1usize << exp;
        let mut t = OpenAddressingTable::with_options_and_rng(
            HashOptions::new().size(initial).load_factor(threshold).strategy(strategy),
            &mut StdRng::seed_from_u64(seed),
        ).unwrap();
        for (i, k) in keys.iter().enumerate() {
            prop_assert_eq!(t.insert(k, i), Ok(None));
        }
        prop_assert_eq!(t.size(), expected_size(keys.len(), initial, threshold));
        prop_assert_eq!(t.used(), keys.len());
        for (i, k) in keys.iter().enumerate() {
            prop_assert_eq!(t.lookup(k), Some(&i));
        }
    }
}

// Property 2: keys never inserted are absent.
proptest! {
    #[test]
    fn prop_absent_keys_miss(
        present in proptest::collection::btree_set("[a-m]{1,6}", 0..100),
        absent in proptest::collection::btree_set("[n-z]{1,6}", 1..50),
        strategy in arb_strategy(),
    ) {
        let mut t = OpenAddressingTable::with_options(
            HashOptions::new().size(4).strategy(strategy),
        ).unwrap();
        for k in &present {
            t.insert(k, ()).unwrap();
        }
        for k in &absent {
            prop_assert!(t.lookup(k).is_none());
            prop_assert_eq!(t.delete(k), None);
        }
        prop_assert_eq!(t.used(), present.len());
    }
}

// Property 3: deleting a subset leaves exactly the complement.
proptest! {
    #[test]
    fn prop_delete_then_absent(
        keys in proptest::collection::vec("[a-z]{1,6}", 1..120)
            .prop_map(|v| v.into_iter().collect::<BTreeSet<_>>()),
        mask in proptest::collection::vec(any::<bool>(), 120),
        strategy in arb_strategy(),
    ) {
        let mut t = OpenAddressingTable::with_options(
            HashOptions::new().size(2).strategy(strategy),
        ).unwrap();
        for (i, k) in keys.iter().enumerate() {
            t.insert(k, i).unwrap();
        }
        let size_before = t.size();
        let mut removed = 0;
        for (i, k) in keys.iter().enumerate() {
            if mask[i] {
                prop_assert_eq!(t.delete(k), Some(i));
                removed += 1;
            }
        }
        prop_assert_eq!(t.size(), size_before);
        prop_assert_eq!(t.used(), keys.len() - removed);
        for (i, k) in keys.iter().enumerate() {
            if mask[i] {
                prop_assert!(!t.contains_key(k));
            } else {
                prop_assert_eq!(t.lookup(k), Some(&i));
            }
        }
    }
}
