//! Grow-only and positive-negative counters
//!
//! Both counters keep one slot per replica and merge slots with `max`, so
//! concurrent increments at different replicas never collide. A replica
//! only ever writes its own slot.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use meld_core::{merge_maps, CrdtError, CrdtResult, ReplicaId, TxCell};

use crate::Crdt;

/// Snapshot of a grow-only counter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GCounterState {
    owner: ReplicaId,
    positives: BTreeMap<ReplicaId, u64>,
}

impl GCounterState {
    /// Create an empty counter state owned by `owner`.
    pub fn new(owner: ReplicaId) -> Self {
        Self {
            owner,
            positives: BTreeMap::new(),
        }
    }

    /// The replica that owns this state.
    pub fn owner(&self) -> &ReplicaId {
        &self.owner
    }

    /// Sum of all replica slots, saturating at the u64 ceiling.
    pub fn value(&self) -> u64 {
        self.positives
            .values()
            .fold(0u64, |acc, v| acc.saturating_add(*v))
    }

    /// Add `amount` to the owner's slot.
    ///
    /// Slot overflow is rejected rather than wrapped; the caller's
    /// transaction aborts and nothing is published.
    pub fn increment(&mut self, amount: u64) -> CrdtResult<()> {
        let slot = self.positives.entry(self.owner.clone()).or_insert(0);
        *slot = slot.checked_add(amount).ok_or_else(|| {
            CrdtError::InvalidArgument(format!(
                "increment by {amount} overflows counter slot for {}",
                self.owner
            ))
        })?;
        Ok(())
    }

    /// Merge a peer snapshot: pointwise maximum per replica slot.
    pub fn merge(&mut self, other: &GCounterState) {
        self.positives = merge_maps(&self.positives, &other.positives, |a, b| *a.max(b));
    }
}

/// Grow-only counter handle.
///
/// Cloning shares the underlying cell; all clones observe the same
/// committed state.
///
/// # Example
///
/// ```
/// use meld_core::ReplicaId;
/// use meld_crdt::GCounter;
///
/// let counter = GCounter::make(ReplicaId::new("a"));
/// counter.increment(5).unwrap();
/// assert_eq!(counter.value(), 5);
/// assert!(counter.decrement(1).is_err());  // grow-only
/// ```
#[derive(Debug, Clone)]
pub struct GCounter {
    cell: TxCell<GCounterState>,
}

impl GCounter {
    /// Create a counter at zero.
    pub fn make(owner: ReplicaId) -> Self {
        Self {
            cell: TxCell::new(GCounterState::new(owner)),
        }
    }

    /// Rehydrate from a persisted snapshot.
    pub fn from_state(state: GCounterState) -> Self {
        Self {
            cell: TxCell::new(state),
        }
    }

    /// Add `amount` to this replica's slot.
    pub fn increment(&self, amount: u64) -> CrdtResult<()> {
        self.cell.update(|state| state.increment(amount))
    }

    /// Grow-only counters cannot go down.
    pub fn decrement(&self, _amount: u64) -> CrdtResult<()> {
        Err(CrdtError::OperationNotSupported(
            "decrement on a grow-only counter".into(),
        ))
    }

    /// Current summed value.
    pub fn value(&self) -> u64 {
        self.cell.read().value()
    }
}

impl Crdt for GCounter {
    type State = GCounterState;

    fn owner(&self) -> ReplicaId {
        self.cell.read().owner.clone()
    }

    fn query(&self) -> GCounterState {
        self.cell.read()
    }

    fn merge(&self, other: &GCounterState) {
        self.cell.mutate(|state| state.merge(other));
    }
}

/// Snapshot of a positive-negative counter: two grow-only maps.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PnCounterState {
    owner: ReplicaId,
    positives: BTreeMap<ReplicaId, u64>,
    negatives: BTreeMap<ReplicaId, u64>,
}

impl PnCounterState {
    /// Create an empty counter state owned by `owner`.
    pub fn new(owner: ReplicaId) -> Self {
        Self {
            owner,
            positives: BTreeMap::new(),
            negatives: BTreeMap::new(),
        }
    }

    /// The replica that owns this state.
    pub fn owner(&self) -> &ReplicaId {
        &self.owner
    }

    /// Net value: Σ positives − Σ negatives, saturating at the i64 bounds.
    pub fn value(&self) -> i64 {
        let pos: i128 = self.positives.values().map(|v| *v as i128).sum();
        let neg: i128 = self.negatives.values().map(|v| *v as i128).sum();
        (pos - neg).clamp(i64::MIN as i128, i64::MAX as i128) as i64
    }

    /// Add `amount` to the owner's positive slot.
    pub fn increment(&mut self, amount: u64) -> CrdtResult<()> {
        bump_slot(&mut self.positives, &self.owner, amount)
    }

    /// Add `amount` to the owner's negative slot.
    pub fn decrement(&mut self, amount: u64) -> CrdtResult<()> {
        bump_slot(&mut self.negatives, &self.owner, amount)
    }

    /// Merge a peer snapshot: pointwise maximum per half, independently.
    pub fn merge(&mut self, other: &PnCounterState) {
        self.positives = merge_maps(&self.positives, &other.positives, |a, b| *a.max(b));
        self.negatives = merge_maps(&self.negatives, &other.negatives, |a, b| *a.max(b));
    }
}

fn bump_slot(
    slots: &mut BTreeMap<ReplicaId, u64>,
    owner: &ReplicaId,
    amount: u64,
) -> CrdtResult<()> {
    let slot = slots.entry(owner.clone()).or_insert(0);
    *slot = slot.checked_add(amount).ok_or_else(|| {
        CrdtError::InvalidArgument(format!("bump by {amount} overflows counter slot for {owner}"))
    })?;
    Ok(())
}

/// Positive-negative counter handle.
#[derive(Debug, Clone)]
pub struct PnCounter {
    cell: TxCell<PnCounterState>,
}

impl PnCounter {
    /// Create a counter at zero.
    pub fn make(owner: ReplicaId) -> Self {
        Self {
            cell: TxCell::new(PnCounterState::new(owner)),
        }
    }

    /// Rehydrate from a persisted snapshot.
    pub fn from_state(state: PnCounterState) -> Self {
        Self {
            cell: TxCell::new(state),
        }
    }

    /// Add `amount` to this replica's positive slot.
    pub fn increment(&self, amount: u64) -> CrdtResult<()> {
        self.cell.update(|state| state.increment(amount))
    }

    /// Add `amount` to this replica's negative slot.
    pub fn decrement(&self, amount: u64) -> CrdtResult<()> {
        self.cell.update(|state| state.decrement(amount))
    }

    /// Current net value.
    pub fn value(&self) -> i64 {
        self.cell.read().value()
    }
}

impl Crdt for PnCounter {
    type State = PnCounterState;

    fn owner(&self) -> ReplicaId {
        self.cell.read().owner.clone()
    }

    fn query(&self) -> PnCounterState {
        self.cell.read()
    }

    fn merge(&self, other: &PnCounterState) {
        self.cell.mutate(|state| state.merge(other));
    }
}
