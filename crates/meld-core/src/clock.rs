//! Vector clocks for causality tracking
//!
//! A vector clock holds one counter per replica that has ever touched it.
//! Counters only grow locally; merging takes the pointwise maximum, which
//! makes merge commutative, associative, and idempotent. Comparing two
//! clocks yields the causal relation between the events they stamp.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::cell::TxCell;
use crate::replica::ReplicaId;

/// Causal relation between two vector clocks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Causality {
    /// Self happened strictly before other
    Before,
    /// Self happened strictly after other
    After,
    /// Identical counters
    Equal,
    /// Neither dominates the other
    Concurrent,
}

/// Snapshot of a vector clock: owning replica plus one counter per
/// observed replica. Absent replicas read as 0.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VectorClockState {
    owner: ReplicaId,
    counters: BTreeMap<ReplicaId, u64>,
}

impl VectorClockState {
    /// Create an all-zero clock owned by `owner`.
    pub fn new(owner: ReplicaId) -> Self {
        Self {
            owner,
            counters: BTreeMap::new(),
        }
    }

    /// The replica that owns this clock.
    pub fn owner(&self) -> &ReplicaId {
        &self.owner
    }

    /// Current counter for a replica, 0 if never observed.
    pub fn get(&self, replica: &ReplicaId) -> u64 {
        self.counters.get(replica).copied().unwrap_or(0)
    }

    /// Replicas with a non-zero counter, in identifier order.
    pub fn replicas(&self) -> impl Iterator<Item = &ReplicaId> {
        self.counters
            .iter()
            .filter(|(_, count)| **count > 0)
            .map(|(replica, _)| replica)
    }

    /// True when no event has ever been recorded.
    pub fn is_zero(&self) -> bool {
        self.counters.values().all(|count| *count == 0)
    }

    /// Bump the owner's counter by one.
    ///
    /// Counters are monotone within a replica's local history;
    /// saturating_add keeps that invariant even at the u64 ceiling.
    pub fn increment(&mut self) {
        let entry = self.counters.entry(self.owner.clone()).or_insert(0);
        *entry = entry.saturating_add(1);
    }

    /// Merge another clock in: pointwise maximum over the union of keys.
    pub fn merge(&mut self, other: &VectorClockState) {
        for (replica, &count) in &other.counters {
            let entry = self.counters.entry(replica.clone()).or_insert(0);
            *entry = (*entry).max(count);
        }
    }

    /// Causally compare two clocks.
    ///
    /// Iterates the union of both key sets, treating absent keys as 0,
    /// and exits early once evidence in both directions has been seen.
    pub fn compare(&self, other: &VectorClockState) -> Causality {
        let mut has_less = false;
        let mut has_greater = false;

        for replica in self.counters.keys().chain(other.counters.keys()) {
            let ours = self.get(replica);
            let theirs = other.get(replica);
            if ours < theirs {
                has_less = true;
            } else if ours > theirs {
                has_greater = true;
            }
            if has_less && has_greater {
                return Causality::Concurrent;
            }
        }

        match (has_less, has_greater) {
            (false, false) => Causality::Equal,
            (true, false) => Causality::Before,
            (false, true) => Causality::After,
            (true, true) => Causality::Concurrent,
        }
    }

    /// True iff self happened strictly before other.
    pub fn happened_before(&self, other: &VectorClockState) -> bool {
        self.compare(other) == Causality::Before
    }

    /// True iff self happened strictly after other.
    pub fn happened_after(&self, other: &VectorClockState) -> bool {
        self.compare(other) == Causality::After
    }

    /// True iff neither clock dominates the other.
    pub fn concurrent(&self, other: &VectorClockState) -> bool {
        self.compare(other) == Causality::Concurrent
    }

    /// True iff both clocks carry identical counters.
    pub fn equal(&self, other: &VectorClockState) -> bool {
        self.compare(other) == Causality::Equal
    }
}

/// Vector clock service: a `VectorClockState` living in a transactional
/// cell so concurrent local callers stamp events consistently.
///
/// Cloning the service shares the underlying cell; a replica's register
/// and map can therefore be driven by the same clock.
#[derive(Debug, Clone)]
pub struct VectorClock {
    cell: TxCell<VectorClockState>,
}

impl VectorClock {
    /// Create a clock service with all counters at zero.
    pub fn make(owner: ReplicaId) -> Self {
        Self {
            cell: TxCell::new(VectorClockState::new(owner)),
        }
    }

    /// Rehydrate a clock service from a persisted snapshot.
    pub fn from_state(state: VectorClockState) -> Self {
        Self {
            cell: TxCell::new(state),
        }
    }

    /// Bump the owner's counter and return the resulting snapshot.
    pub fn increment(&self) -> VectorClockState {
        self.cell.mutate(|state| {
            state.increment();
            state.clone()
        })
    }

    /// Current counter for a replica.
    pub fn get(&self, replica: &ReplicaId) -> u64 {
        self.cell.read().get(replica)
    }

    /// Fold an externally delivered snapshot into this clock.
    pub fn merge(&self, other: &VectorClockState) {
        self.cell.mutate(|state| state.merge(other));
    }

    /// Immutable point-in-time snapshot.
    pub fn query(&self) -> VectorClockState {
        self.cell.read()
    }

    /// The underlying cell, for transactions that compose a clock bump
    /// with another state change.
    pub fn cell(&self) -> &TxCell<VectorClockState> {
        &self.cell
    }
}
