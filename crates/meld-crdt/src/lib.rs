//! # MELD CRDT: State-Based Convergent Replicated Data Types
//!
//! Each data type here pairs a plain state value (the snapshot exchanged
//! between replicas) with a handle whose mutable state lives in a
//! transactional cell. Mutators act locally, `query` returns an immutable
//! snapshot, and `merge` folds a peer snapshot in through a commutative,
//! associative, idempotent join, so replicas that have seen the same set
//! of updates converge to identical state.
//!
//! Shipped types:
//!
//! - `GCounter` / `PnCounter`: grow-only and signed counters
//! - `GSet` / `TwoPSet` / `OrSet`: grow-only, add-remove, and
//!   observed-remove sets
//! - `LwwRegister` / `MvRegister`: last-writer-wins and multi-value
//!   registers driven by vector clocks
//! - `LwwMap`: per-key last-writer-wins entries with tombstones
//!
//! # Example
//!
//! ```
//! use meld_core::ReplicaId;
//! use meld_crdt::{Crdt, GCounter};
//!
//! let a = GCounter::make(ReplicaId::new("a"));
//! let b = GCounter::make(ReplicaId::new("b"));
//! a.increment(10).unwrap();
//! b.increment(20).unwrap();
//!
//! // Snapshots travel out-of-band; merge folds them in
//! a.merge(&b.query());
//! b.merge(&a.query());
//! assert_eq!(a.value(), 30);
//! assert_eq!(b.value(), 30);
//! ```
//!
//! Based on:
//! - "Conflict-Free Replicated Data Types" (Shapiro et al., 2011)
//! - "A Comprehensive Study of CRDTs" (Shapiro et al., INRIA RR-7506)

use meld_core::ReplicaId;

pub mod counter;
pub mod gset;
pub mod lwwmap;
pub mod mvregister;
pub mod orset;
pub mod register;
pub mod twopset;

pub use counter::{GCounter, GCounterState, PnCounter, PnCounterState};
pub use gset::{GSet, GSetState};
pub use lwwmap::{LwwEntry, LwwMap, LwwMapState};
pub use mvregister::{MvEntry, MvRegister, MvRegisterState};
pub use orset::{OrSet, OrSetState, ParseTagError, Tag};
pub use register::{LwwRegister, LwwRegisterState};
pub use twopset::{TwoPSet, TwoPSetState};

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::counter::{GCounter, PnCounter};
    pub use crate::gset::GSet;
    pub use crate::lwwmap::LwwMap;
    pub use crate::mvregister::MvRegister;
    pub use crate::orset::OrSet;
    pub use crate::register::LwwRegister;
    pub use crate::twopset::TwoPSet;
    pub use crate::Crdt;

    pub use meld_core::ReplicaId;
}

/// Common surface of every state-based CRDT handle.
///
/// `State` is the immutable snapshot type: the only object replicas ever
/// exchange, and the shape persisted by the storage adapter.
pub trait Crdt {
    /// Snapshot type produced by `query` and consumed by `merge`.
    type State: Clone + std::fmt::Debug;

    /// The replica this handle writes as.
    fn owner(&self) -> ReplicaId;

    /// Immutable point-in-time snapshot of the current state.
    fn query(&self) -> Self::State;

    /// Fold an externally delivered snapshot into the local state.
    fn merge(&self, other: &Self::State);
}
