//! Two-phase set: add-set plus a permanent tombstone set
//!
//! Removal wins forever: once an element is tombstoned anywhere, every
//! replica that merges that state sees it as removed, and later adds are
//! absorbed into the add-set but stay invisible.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use meld_core::{union_sets, ReplicaId, TxCell};

use crate::Crdt;

/// Snapshot of a two-phase set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TwoPSetState<A: Ord> {
    owner: ReplicaId,
    added: BTreeSet<A>,
    removed: BTreeSet<A>,
}

impl<A: Ord + Clone> TwoPSetState<A> {
    /// Create an empty set state owned by `owner`.
    pub fn new(owner: ReplicaId) -> Self {
        Self {
            owner,
            added: BTreeSet::new(),
            removed: BTreeSet::new(),
        }
    }

    /// The replica that owns this state.
    pub fn owner(&self) -> &ReplicaId {
        &self.owner
    }

    /// Insert an element into the add-set.
    pub fn add(&mut self, element: A) {
        self.added.insert(element);
    }

    /// Tombstone an element.
    ///
    /// The element need not be present: pre-tombstoning is legal and
    /// suppresses any add, past or future.
    pub fn remove(&mut self, element: A) {
        self.removed.insert(element);
    }

    /// Membership: added and not tombstoned.
    pub fn has(&self, element: &A) -> bool {
        self.added.contains(element) && !self.removed.contains(element)
    }

    /// Visible elements (added minus tombstoned), in natural order.
    pub fn values(&self) -> Vec<A> {
        self.added.difference(&self.removed).cloned().collect()
    }

    /// Number of visible elements.
    pub fn size(&self) -> usize {
        self.added.difference(&self.removed).count()
    }

    /// Merge a peer snapshot: union add-sets and tombstone-sets
    /// independently.
    pub fn merge(&mut self, other: &TwoPSetState<A>) {
        self.added = union_sets(&self.added, &other.added);
        self.removed = union_sets(&self.removed, &other.removed);
    }
}

/// Two-phase set handle.
#[derive(Debug, Clone)]
pub struct TwoPSet<A: Ord + Clone> {
    cell: TxCell<TwoPSetState<A>>,
}

impl<A: Ord + Clone + std::fmt::Debug> TwoPSet<A> {
    /// Create an empty set.
    pub fn make(owner: ReplicaId) -> Self {
        Self {
            cell: TxCell::new(TwoPSetState::new(owner)),
        }
    }

    /// Rehydrate from a persisted snapshot.
    pub fn from_state(state: TwoPSetState<A>) -> Self {
        Self {
            cell: TxCell::new(state),
        }
    }

    /// Insert an element.
    pub fn add(&self, element: A) {
        self.cell.mutate(|state| state.add(element));
    }

    /// Tombstone an element, permanently.
    pub fn remove(&self, element: A) {
        self.cell.mutate(|state| state.remove(element));
    }

    /// Membership test on the visible set.
    pub fn has(&self, element: &A) -> bool {
        self.cell.read().has(element)
    }

    /// Visible elements, in natural order.
    pub fn values(&self) -> Vec<A> {
        self.cell.read().values()
    }

    /// Number of visible elements.
    pub fn size(&self) -> usize {
        self.cell.read().size()
    }
}

impl<A: Ord + Clone + std::fmt::Debug> Crdt for TwoPSet<A> {
    type State = TwoPSetState<A>;

    fn owner(&self) -> ReplicaId {
        self.cell.read().owner.clone()
    }

    fn query(&self) -> TwoPSetState<A> {
        self.cell.read()
    }

    fn merge(&self, other: &TwoPSetState<A>) {
        self.cell.mutate(|state| state.merge(other));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn id(s: &str) -> ReplicaId {
        ReplicaId::new(s)
    }

    #[test]
    fn test_add_remove_add_stays_invisible() {
        let set = TwoPSet::make(id("a"));
        set.add("e".to_string());
        set.remove("e".to_string());
        set.add("e".to_string());

        assert!(!set.has(&"e".to_string()));
        assert_eq!(set.size(), 0);
    }

    #[test]
    fn test_pre_tombstone_suppresses_later_add() {
        let set = TwoPSet::make(id("a"));
        set.remove("ghost".to_string());
        set.add("ghost".to_string());

        assert!(!set.has(&"ghost".to_string()));
    }

    #[test]
    fn test_concurrent_add_and_remove_converge_to_removed() {
        let a = TwoPSet::make(id("a"));
        let b = TwoPSet::make(id("b"));

        a.add("e".to_string());
        b.remove("e".to_string());

        a.merge(&b.query());
        b.merge(&a.query());

        assert!(!a.has(&"e".to_string()));
        assert!(!b.has(&"e".to_string()));
        assert_eq!(a.query(), {
            let mut expectation = b.query();
            // owner differs between replicas; visible content must not
            expectation.owner = id("a");
            expectation
        });
    }

    #[test]
    fn test_scenario_two_replicas_mixed_ops() {
        let m = TwoPSet::make(id("m"));
        let n = TwoPSet::make(id("n"));

        m.add("x".to_string());
        m.add("y".to_string());
        n.add("y".to_string());
        n.add("z".to_string());
        n.remove("y".to_string());

        m.merge(&n.query());
        n.merge(&m.query());

        assert_eq!(m.values(), vec!["x".to_string(), "z".to_string()]);
        assert_eq!(n.values(), vec!["x".to_string(), "z".to_string()]);
    }
}
