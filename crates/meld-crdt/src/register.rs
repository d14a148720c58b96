//! Last-writer-wins register
//!
//! A single optional value stamped with a vector clock. Causally ordered
//! writes resolve by the clock; concurrent writes fall back to the total
//! order on writer identifiers, so every replica picks the same winner.

use serde::{Deserialize, Serialize};

use meld_core::{Causality, ReplicaId, TxCell, VectorClockState};

use crate::Crdt;

/// Snapshot of a last-writer-wins register.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LwwRegisterState<A> {
    owner: ReplicaId,
    writer: ReplicaId,
    value: Option<A>,
    clock: VectorClockState,
}

impl<A: Clone> LwwRegisterState<A> {
    /// Create an empty register state owned by `owner`.
    pub fn new(owner: ReplicaId) -> Self {
        Self {
            writer: owner.clone(),
            clock: VectorClockState::new(owner.clone()),
            owner,
            value: None,
        }
    }

    /// The replica that owns this state.
    pub fn owner(&self) -> &ReplicaId {
        &self.owner
    }

    /// The replica that produced the current value.
    pub fn writer(&self) -> &ReplicaId {
        &self.writer
    }

    /// Current value, `None` when unset or cleared.
    pub fn get(&self) -> Option<&A> {
        self.value.as_ref()
    }

    /// The causal stamp of the current value.
    pub fn clock(&self) -> &VectorClockState {
        &self.clock
    }

    /// Write a value, stamping it causally after everything observed.
    pub fn set(&mut self, value: A) {
        self.value = Some(value);
        self.writer = self.owner.clone();
        self.clock.increment();
    }

    /// Clear the register; the clear itself is a write and wins or loses
    /// against concurrent writes like any other.
    pub fn clear(&mut self) {
        self.value = None;
        self.writer = self.owner.clone();
        self.clock.increment();
    }

    /// Merge a peer snapshot.
    ///
    /// After → keep; Before → adopt; Equal → no change; Concurrent →
    /// adopt exactly when the peer's writer orders above ours. Clocks are
    /// always joined so the next local write is causally after every
    /// observed write.
    pub fn merge(&mut self, other: &LwwRegisterState<A>) {
        let adopt = match self.clock.compare(&other.clock) {
            Causality::After | Causality::Equal => false,
            Causality::Before => true,
            Causality::Concurrent => other.writer > self.writer,
        };
        if adopt {
            self.value = other.value.clone();
            self.writer = other.writer.clone();
        }
        self.clock.merge(&other.clock);
    }
}

/// Last-writer-wins register handle.
///
/// # Example
///
/// ```
/// use meld_core::ReplicaId;
/// use meld_crdt::{Crdt, LwwRegister};
///
/// let r1 = LwwRegister::make(ReplicaId::new("r1"));
/// let r2 = LwwRegister::make(ReplicaId::new("r2"));
///
/// r1.set("A".to_string());
/// r2.merge(&r1.query());
/// r2.set("B".to_string());      // causally after r1's write
/// r1.merge(&r2.query());
///
/// assert_eq!(r1.get(), Some("B".to_string()));
/// ```
#[derive(Debug, Clone)]
pub struct LwwRegister<A: Clone> {
    cell: TxCell<LwwRegisterState<A>>,
}

impl<A: Clone + std::fmt::Debug> LwwRegister<A> {
    /// Create an empty register.
    pub fn make(owner: ReplicaId) -> Self {
        Self {
            cell: TxCell::new(LwwRegisterState::new(owner)),
        }
    }

    /// Create a register holding `initial`.
    pub fn make_with(owner: ReplicaId, initial: A) -> Self {
        let register = Self::make(owner);
        register.set(initial);
        register
    }

    /// Rehydrate from a persisted snapshot.
    pub fn from_state(state: LwwRegisterState<A>) -> Self {
        Self {
            cell: TxCell::new(state),
        }
    }

    /// Write a value.
    pub fn set(&self, value: A) {
        self.cell.mutate(|state| state.set(value));
    }

    /// Clear the register.
    pub fn clear(&self) {
        self.cell.mutate(|state| state.clear());
    }

    /// Current value.
    pub fn get(&self) -> Option<A> {
        self.cell.read().value
    }
}

impl<A: Clone + std::fmt::Debug> Crdt for LwwRegister<A> {
    type State = LwwRegisterState<A>;

    fn owner(&self) -> ReplicaId {
        self.cell.read().owner.clone()
    }

    fn query(&self) -> LwwRegisterState<A> {
        self.cell.read()
    }

    fn merge(&self, other: &LwwRegisterState<A>) {
        self.cell.mutate(|state| state.merge(other));
    }
}
