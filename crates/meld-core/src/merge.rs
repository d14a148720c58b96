//! Merge primitives shared by the counter and clock CRDTs
//!
//! `merge_maps` produces a map over the union of both key sets; the CRDT
//! laws (commutativity, associativity, idempotence) transfer whenever the
//! combiner itself satisfies them, as `max` does.

use std::collections::{BTreeMap, BTreeSet};

/// Merge two maps key-wise over the union of their key sets.
///
/// Keys missing on either side contribute `V::default()` to the
/// combiner, mirroring the "absent reads as identity" rule of the
/// counter and clock states.
pub fn merge_maps<K, V, F>(a: &BTreeMap<K, V>, b: &BTreeMap<K, V>, combine: F) -> BTreeMap<K, V>
where
    K: Ord + Clone,
    V: Clone + Default,
    F: Fn(&V, &V) -> V,
{
    let mut merged = BTreeMap::new();
    let identity = V::default();

    for key in a.keys().chain(b.keys()) {
        if merged.contains_key(key) {
            continue;
        }
        let left = a.get(key).unwrap_or(&identity);
        let right = b.get(key).unwrap_or(&identity);
        merged.insert(key.clone(), combine(left, right));
    }

    merged
}

/// Union of two sets.
pub fn union_sets<T: Ord + Clone>(a: &BTreeSet<T>, b: &BTreeSet<T>) -> BTreeSet<T> {
    a.union(b).cloned().collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn map(pairs: &[(&str, u64)]) -> BTreeMap<String, u64> {
        pairs.iter().map(|(k, v)| (k.to_string(), *v)).collect()
    }

    #[test]
    fn test_merge_maps_covers_union_of_keys() {
        let a = map(&[("x", 3), ("y", 1)]);
        let b = map(&[("y", 5), ("z", 2)]);

        let merged = merge_maps(&a, &b, |l, r| *l.max(r));
        assert_eq!(merged, map(&[("x", 3), ("y", 5), ("z", 2)]));
    }

    #[test]
    fn test_merge_maps_with_max_is_commutative_and_idempotent() {
        let a = map(&[("x", 3), ("y", 7)]);
        let b = map(&[("x", 9)]);

        let ab = merge_maps(&a, &b, |l, r| *l.max(r));
        let ba = merge_maps(&b, &a, |l, r| *l.max(r));
        assert_eq!(ab, ba);

        let again = merge_maps(&ab, &b, |l, r| *l.max(r));
        assert_eq!(again, ab);
    }

    #[test]
    fn test_union_sets() {
        let a: BTreeSet<_> = ["a", "b"].into_iter().map(String::from).collect();
        let b: BTreeSet<_> = ["b", "c"].into_iter().map(String::from).collect();

        let u = union_sets(&a, &b);
        assert_eq!(u.len(), 3);
        assert!(u.contains("a") && u.contains("b") && u.contains("c"));
    }
}
