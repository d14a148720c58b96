//! Grow-only set

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use meld_core::{union_sets, ReplicaId, TxCell};

use crate::Crdt;

/// Snapshot of a grow-only set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GSetState<A: Ord> {
    owner: ReplicaId,
    added: BTreeSet<A>,
}

impl<A: Ord + Clone> GSetState<A> {
    /// Create an empty set state owned by `owner`.
    pub fn new(owner: ReplicaId) -> Self {
        Self {
            owner,
            added: BTreeSet::new(),
        }
    }

    /// The replica that owns this state.
    pub fn owner(&self) -> &ReplicaId {
        &self.owner
    }

    /// Insert an element. Once added, an element is never removed.
    pub fn add(&mut self, element: A) {
        self.added.insert(element);
    }

    /// Membership test.
    pub fn has(&self, element: &A) -> bool {
        self.added.contains(element)
    }

    /// All elements, in their natural order.
    pub fn values(&self) -> Vec<A> {
        self.added.iter().cloned().collect()
    }

    /// Number of elements.
    pub fn size(&self) -> usize {
        self.added.len()
    }

    /// Merge a peer snapshot: set union.
    pub fn merge(&mut self, other: &GSetState<A>) {
        self.added = union_sets(&self.added, &other.added);
    }
}

/// Grow-only set handle.
#[derive(Debug, Clone)]
pub struct GSet<A: Ord + Clone> {
    cell: TxCell<GSetState<A>>,
}

impl<A: Ord + Clone + std::fmt::Debug> GSet<A> {
    /// Create an empty set.
    pub fn make(owner: ReplicaId) -> Self {
        Self {
            cell: TxCell::new(GSetState::new(owner)),
        }
    }

    /// Rehydrate from a persisted snapshot.
    pub fn from_state(state: GSetState<A>) -> Self {
        Self {
            cell: TxCell::new(state),
        }
    }

    /// Insert an element.
    pub fn add(&self, element: A) {
        self.cell.mutate(|state| state.add(element));
    }

    /// Membership test.
    pub fn has(&self, element: &A) -> bool {
        self.cell.read().has(element)
    }

    /// All elements, in their natural order.
    pub fn values(&self) -> Vec<A> {
        self.cell.read().values()
    }

    /// Number of elements.
    pub fn size(&self) -> usize {
        self.cell.read().size()
    }
}

impl<A: Ord + Clone + std::fmt::Debug> Crdt for GSet<A> {
    type State = GSetState<A>;

    fn owner(&self) -> ReplicaId {
        self.cell.read().owner.clone()
    }

    fn query(&self) -> GSetState<A> {
        self.cell.read()
    }

    fn merge(&self, other: &GSetState<A>) {
        self.cell.mutate(|state| state.merge(other));
    }
}
