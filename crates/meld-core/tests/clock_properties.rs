//! Property-based tests for vector clock merge and comparison

use proptest::prelude::*;

use meld_core::{Causality, ReplicaId, VectorClockState};

const REPLICAS: [&str; 4] = ["alpha", "beta", "gamma", "delta"];

fn arb_clock() -> impl Strategy<Value = VectorClockState> {
    prop::collection::vec((0..4usize, 1..6u64), 0..10).prop_map(|bumps| {
        let mut clocks: Vec<VectorClockState> = REPLICAS
            .iter()
            .map(|name| VectorClockState::new(ReplicaId::new(*name)))
            .collect();
        for (replica, count) in bumps {
            for _ in 0..count {
                clocks[replica].increment();
            }
        }
        let mut merged = VectorClockState::new(ReplicaId::new(REPLICAS[0]));
        for clock in &clocks {
            merged.merge(clock);
        }
        merged
    })
}

proptest! {
    #[test]
    fn merge_is_commutative(a in arb_clock(), b in arb_clock(), x in arb_clock()) {
        let mut ab = x.clone();
        ab.merge(&a);
        ab.merge(&b);

        let mut ba = x;
        ba.merge(&b);
        ba.merge(&a);

        prop_assert_eq!(ab, ba);
    }

    #[test]
    fn merge_is_associative(a in arb_clock(), b in arb_clock(), c in arb_clock()) {
        let mut left = a.clone();
        left.merge(&b);
        left.merge(&c);

        let mut bc = b;
        bc.merge(&c);
        let mut right = a;
        right.merge(&bc);

        prop_assert_eq!(left, right);
    }

    #[test]
    fn merge_is_idempotent(a in arb_clock(), x in arb_clock()) {
        let mut once = x.clone();
        once.merge(&a);

        let mut twice = x;
        twice.merge(&a);
        twice.merge(&a);

        prop_assert_eq!(once, twice);
    }

    #[test]
    fn compare_is_reflexive(a in arb_clock()) {
        prop_assert_eq!(a.compare(&a), Causality::Equal);
        prop_assert!(a.equal(&a));
    }

    #[test]
    fn compare_is_antisymmetric(a in arb_clock(), b in arb_clock()) {
        match a.compare(&b) {
            Causality::Before => prop_assert_eq!(b.compare(&a), Causality::After),
            Causality::After => prop_assert_eq!(b.compare(&a), Causality::Before),
            Causality::Equal => prop_assert_eq!(b.compare(&a), Causality::Equal),
            Causality::Concurrent => prop_assert_eq!(b.compare(&a), Causality::Concurrent),
        }
    }

    #[test]
    fn merged_clock_dominates_or_equals_both_inputs(a in arb_clock(), b in arb_clock()) {
        let mut joined = a.clone();
        joined.merge(&b);

        for side in [&a, &b] {
            let relation = side.compare(&joined);
            prop_assert!(
                relation == Causality::Before || relation == Causality::Equal,
                "join must dominate its inputs, got {:?}",
                relation
            );
        }
    }

    #[test]
    fn increment_strictly_advances(a in arb_clock()) {
        let mut advanced = a.clone();
        advanced.increment();
        prop_assert_eq!(a.compare(&advanced), Causality::Before);
    }
}
