//! # MELD STORE: Pluggable Persistence for CRDT State
//!
//! Storage is split into three layers:
//!
//! - `StateStore`: the backend trait, seeing only opaque string records
//! - `StateSchema` / `TypedStore`: a typed view over a backend, keyed
//!   `{namespace}:{kind}:{replica_id}` per `StoreConfig`
//! - `MemoryStore`: the bundled process-memory backend
//!
//! Replicas load state at birth and save at orderly shutdown; the wiring
//! for that lifecycle lives in `meld-replica`.
//!
//! # Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use meld_core::ReplicaId;
//! use meld_store::{MemoryStore, StateSchema, StoreConfig, TypedStore};
//!
//! let store: TypedStore<MyState> = TypedStore::new(
//!     Arc::new(MemoryStore::new()),
//!     StateSchema::new("my-state"),
//!     StoreConfig::from_env(),
//! );
//!
//! store.save(&ReplicaId::new("r1"), &state).await?;
//! let loaded = store.load(&ReplicaId::new("r1")).await?;
//! ```

pub mod config;
pub mod error;
pub mod memory;
pub mod schema;
pub mod store;

pub use config::StoreConfig;
pub use error::{StoreError, StoreResult};
pub use memory::MemoryStore;
pub use schema::{StateSchema, TypedStore};
pub use store::StateStore;
