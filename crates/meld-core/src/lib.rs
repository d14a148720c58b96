//! # MELD CORE: Replica Identity and Causal Ordering
//!
//! Foundation crate for the Meld CRDT library:
//!
//! - `ReplicaId`: totally ordered replica identifiers
//! - `VectorClock` / `VectorClockState`: per-replica counters with causal
//!   comparison (`Before` / `After` / `Equal` / `Concurrent`)
//! - `TxCell`: the transactional cell every replica's state lives in
//! - map/set merge primitives shared by the counter and clock merges
//!
//! # Example
//!
//! ```
//! use meld_core::{Causality, ReplicaId, VectorClockState};
//!
//! let mut a = VectorClockState::new(ReplicaId::new("a"));
//! let mut b = VectorClockState::new(ReplicaId::new("b"));
//! a.increment();
//! b.increment();
//! assert_eq!(a.compare(&b), Causality::Concurrent);
//!
//! b.merge(&a);
//! b.increment();
//! assert_eq!(a.compare(&b), Causality::Before);
//! ```
//!
//! Based on:
//! - "Conflict-Free Replicated Data Types" (Shapiro et al., 2011)
//! - "Virtual Time and Global States of Distributed Systems" (Mattern, 1989)

pub mod cell;
pub mod clock;
pub mod error;
pub mod merge;
pub mod replica;

pub use cell::{commit2, commit3, mutate2, TxCell};
pub use clock::{Causality, VectorClock, VectorClockState};
pub use error::{CrdtError, CrdtResult};
pub use merge::{merge_maps, union_sets};
pub use replica::ReplicaId;
