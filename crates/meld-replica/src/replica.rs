//! Per-replica wiring without persistence
//!
//! A `Replica` bundles an identity with the vector clock service that
//! clock-driven components on that replica share. Constructing the
//! components through the bundle guarantees they stamp against one
//! causal timeline; there is no process-global clock anywhere.

use std::fmt::Debug;

use meld_core::{ReplicaId, VectorClock};
use meld_crdt::{GCounter, GSet, LwwMap, LwwRegister, MvRegister, OrSet, PnCounter, TwoPSet};

/// One node's identity plus its clock service.
#[derive(Debug, Clone)]
pub struct Replica {
    id: ReplicaId,
    clock: VectorClock,
}

impl Replica {
    /// Create a replica with a fresh, all-zero clock.
    pub fn new(id: ReplicaId) -> Self {
        let clock = VectorClock::make(id.clone());
        Self { id, clock }
    }

    /// This replica's identifier.
    pub fn id(&self) -> &ReplicaId {
        &self.id
    }

    /// The clock service shared by this replica's components.
    pub fn clock(&self) -> &VectorClock {
        &self.clock
    }

    /// Grow-only counter owned by this replica.
    pub fn g_counter(&self) -> GCounter {
        GCounter::make(self.id.clone())
    }

    /// Positive-negative counter owned by this replica.
    pub fn pn_counter(&self) -> PnCounter {
        PnCounter::make(self.id.clone())
    }

    /// Grow-only set owned by this replica.
    pub fn g_set<A: Ord + Clone + Debug>(&self) -> GSet<A> {
        GSet::make(self.id.clone())
    }

    /// Two-phase set owned by this replica.
    pub fn two_p_set<A: Ord + Clone + Debug>(&self) -> TwoPSet<A> {
        TwoPSet::make(self.id.clone())
    }

    /// Observed-remove set owned by this replica.
    pub fn or_set<A: Ord + Clone + Debug>(&self) -> OrSet<A> {
        OrSet::make(self.id.clone())
    }

    /// Last-writer-wins register owned by this replica.
    pub fn lww_register<A: Clone + Debug>(&self) -> LwwRegister<A> {
        LwwRegister::make(self.id.clone())
    }

    /// Multi-value register owned by this replica.
    pub fn mv_register<A: Clone + PartialEq + Debug>(&self) -> MvRegister<A> {
        MvRegister::make(self.id.clone())
    }

    /// Last-writer-wins map stamping against this replica's shared clock.
    ///
    /// Every map minted here shares the bundle's clock, so writes across
    /// maps on one replica are totally ordered by their stamps.
    pub fn lww_map<K, V>(&self) -> LwwMap<K, V>
    where
        K: Ord + Clone + Debug,
        V: Clone + Debug,
    {
        LwwMap::with_clock(self.id.clone(), self.clock.clone())
    }
}
