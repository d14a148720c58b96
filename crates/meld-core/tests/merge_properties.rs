//! Property-based tests for the merge primitives
//!
//! The CRDT laws only transfer through `merge_maps` when the combiner is
//! itself commutative, associative, and idempotent. These tests pin that
//! transfer for `max`, the combiner every counter and clock uses.

use std::collections::{BTreeMap, BTreeSet};

use proptest::prelude::*;

use meld_core::{merge_maps, union_sets};

fn arb_map() -> impl Strategy<Value = BTreeMap<String, u64>> {
    prop::collection::btree_map("[a-d]{1,2}", 0..1_000u64, 0..8)
}

fn arb_set() -> impl Strategy<Value = BTreeSet<String>> {
    prop::collection::btree_set("[a-f]{1,2}", 0..10)
}

fn max_merge(a: &BTreeMap<String, u64>, b: &BTreeMap<String, u64>) -> BTreeMap<String, u64> {
    merge_maps(a, b, |left, right| *left.max(right))
}

proptest! {
    #[test]
    fn merge_maps_with_max_is_commutative(a in arb_map(), b in arb_map()) {
        prop_assert_eq!(max_merge(&a, &b), max_merge(&b, &a));
    }

    #[test]
    fn merge_maps_with_max_is_associative(a in arb_map(), b in arb_map(), c in arb_map()) {
        let left = max_merge(&max_merge(&a, &b), &c);
        let right = max_merge(&a, &max_merge(&b, &c));
        prop_assert_eq!(left, right);
    }

    #[test]
    fn merge_maps_with_max_is_idempotent(a in arb_map(), b in arb_map()) {
        let once = max_merge(&a, &b);
        let twice = max_merge(&once, &b);
        prop_assert_eq!(once, twice);
    }

    #[test]
    fn merge_maps_key_set_is_the_union(a in arb_map(), b in arb_map()) {
        let merged = max_merge(&a, &b);
        for key in a.keys().chain(b.keys()) {
            prop_assert!(merged.contains_key(key));
        }
        for key in merged.keys() {
            prop_assert!(a.contains_key(key) || b.contains_key(key));
        }
    }

    #[test]
    fn merge_maps_never_loses_ground(a in arb_map(), b in arb_map()) {
        let merged = max_merge(&a, &b);
        for (key, value) in a.iter().chain(b.iter()) {
            prop_assert!(merged[key] >= *value);
        }
    }

    #[test]
    fn union_sets_laws(a in arb_set(), b in arb_set(), c in arb_set()) {
        prop_assert_eq!(union_sets(&a, &b), union_sets(&b, &a));

        let left = union_sets(&union_sets(&a, &b), &c);
        let right = union_sets(&a, &union_sets(&b, &c));
        prop_assert_eq!(left, right);

        let ab = union_sets(&a, &b);
        prop_assert_eq!(union_sets(&ab, &b), ab);
    }
}
