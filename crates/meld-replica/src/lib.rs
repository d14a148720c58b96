//! # MELD REPLICA: Wiring CRDTs to Persistence
//!
//! The lifecycle layer of the library:
//!
//! - `Hydrate`: how each CRDT variant is built empty or rebuilt from a
//!   persisted snapshot
//! - `Persistent<C>`: a component bound to a typed store; loads at
//!   open, saves at close, logs-and-swallows save failures on shutdown,
//!   and hands the save to a spawned task if dropped without a close
//! - `Registry`: mints persistent instances of every variant over one
//!   shared backend
//!
//! Plain, unpersisted replicas are constructed directly on the types in
//! `meld-crdt`; nothing here is required to use the data types alone.
//!
//! # Example
//!
//! ```rust,ignore
//! use meld_core::ReplicaId;
//! use meld_replica::Registry;
//!
//! #[tokio::main]
//! async fn main() {
//!     let registry = Registry::in_memory();
//!
//!     let counter = registry.g_counter(ReplicaId::new("r1")).await.unwrap();
//!     counter.increment(5).unwrap();
//!     counter.close().await;          // saves before shutdown
//!
//!     let revived = registry.g_counter(ReplicaId::new("r1")).await.unwrap();
//!     assert_eq!(revived.value(), 5); // rehydrated from storage
//! }
//! ```

pub mod hydrate;
pub mod persistent;
pub mod registry;
pub mod replica;

pub use hydrate::Hydrate;
pub use persistent::Persistent;
pub use registry::Registry;
pub use replica::Replica;

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::hydrate::Hydrate;
    pub use crate::persistent::Persistent;
    pub use crate::registry::Registry;
    pub use crate::replica::Replica;

    pub use meld_core::ReplicaId;
    pub use meld_crdt::Crdt;
}
