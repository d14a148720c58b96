//! Rehydration trait wiring CRDT handles to persisted snapshots

use std::fmt::Debug;

use meld_core::ReplicaId;
use meld_crdt::{
    Crdt, GCounter, GSet, LwwMap, LwwRegister, MvRegister, OrSet, PnCounter, TwoPSet,
};

/// A CRDT handle that can be built empty or rebuilt from a snapshot.
///
/// `KIND` tags the persisted record so different state types for the
/// same replica never collide in one backend.
pub trait Hydrate: Crdt + Sized {
    /// Record kind tag used in storage keys.
    const KIND: &'static str;

    /// Fresh, empty instance for `owner`.
    fn make(owner: ReplicaId) -> Self;

    /// Instance rebuilt from a persisted snapshot.
    fn from_state(state: Self::State) -> Self;
}

impl Hydrate for GCounter {
    const KIND: &'static str = "g-counter";

    fn make(owner: ReplicaId) -> Self {
        GCounter::make(owner)
    }

    fn from_state(state: Self::State) -> Self {
        GCounter::from_state(state)
    }
}

impl Hydrate for PnCounter {
    const KIND: &'static str = "pn-counter";

    fn make(owner: ReplicaId) -> Self {
        PnCounter::make(owner)
    }

    fn from_state(state: Self::State) -> Self {
        PnCounter::from_state(state)
    }
}

impl<A: Ord + Clone + Debug> Hydrate for GSet<A> {
    const KIND: &'static str = "g-set";

    fn make(owner: ReplicaId) -> Self {
        GSet::make(owner)
    }

    fn from_state(state: Self::State) -> Self {
        GSet::from_state(state)
    }
}

impl<A: Ord + Clone + Debug> Hydrate for TwoPSet<A> {
    const KIND: &'static str = "2p-set";

    fn make(owner: ReplicaId) -> Self {
        TwoPSet::make(owner)
    }

    fn from_state(state: Self::State) -> Self {
        TwoPSet::from_state(state)
    }
}

impl<A: Ord + Clone + Debug> Hydrate for OrSet<A> {
    const KIND: &'static str = "or-set";

    fn make(owner: ReplicaId) -> Self {
        OrSet::make(owner)
    }

    // Seeds the tag sequence above every persisted own tag.
    fn from_state(state: Self::State) -> Self {
        OrSet::from_state(state)
    }
}

impl<A: Clone + Debug> Hydrate for LwwRegister<A> {
    const KIND: &'static str = "lww-register";

    fn make(owner: ReplicaId) -> Self {
        LwwRegister::make(owner)
    }

    fn from_state(state: Self::State) -> Self {
        LwwRegister::from_state(state)
    }
}

impl<A: Clone + PartialEq + Debug> Hydrate for MvRegister<A> {
    const KIND: &'static str = "mv-register";

    fn make(owner: ReplicaId) -> Self {
        MvRegister::make(owner)
    }

    fn from_state(state: Self::State) -> Self {
        MvRegister::from_state(state)
    }
}

impl<K: Ord + Clone + Debug, V: Clone + Debug> Hydrate for LwwMap<K, V> {
    const KIND: &'static str = "lww-map";

    fn make(owner: ReplicaId) -> Self {
        LwwMap::make(owner)
    }

    // Rebuilds the clock service from the persisted entry stamps.
    fn from_state(state: Self::State) -> Self {
        LwwMap::from_state(state)
    }
}
