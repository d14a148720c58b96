//! Registry: constructs replicas and injects persistence
//!
//! The registry bundles a storage backend with a key-layout config and
//! mints persistent instances of every CRDT variant. Plain, unpersisted
//! constructors remain available on the types themselves (`GCounter::
//! make` and friends); the registry is the factory for the scoped form.

use std::fmt::Debug;
use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde::Serialize;

use meld_core::ReplicaId;
use meld_crdt::{GCounter, GSet, LwwMap, LwwRegister, MvRegister, OrSet, PnCounter, TwoPSet};
use meld_store::{MemoryStore, StateSchema, StateStore, StoreConfig, StoreResult, TypedStore};

use crate::hydrate::Hydrate;
use crate::persistent::Persistent;

/// Factory for persistent CRDT components sharing one backend.
#[derive(Clone)]
pub struct Registry {
    backend: Arc<dyn StateStore>,
    config: StoreConfig,
}

impl Registry {
    /// Create a registry over an explicit backend and key layout.
    pub fn new(backend: Arc<dyn StateStore>, config: StoreConfig) -> Self {
        Self { backend, config }
    }

    /// Registry over the bundled in-memory backend, namespaced from the
    /// environment.
    pub fn in_memory() -> Self {
        Self::new(Arc::new(MemoryStore::new()), StoreConfig::from_env())
    }

    /// The key layout in use.
    pub fn config(&self) -> &StoreConfig {
        &self.config
    }

    /// Typed store for one component kind over the shared backend.
    pub fn typed_store<C>(&self) -> TypedStore<C::State>
    where
        C: Hydrate,
        C::State: Serialize + DeserializeOwned,
    {
        TypedStore::new(
            Arc::clone(&self.backend),
            StateSchema::new(C::KIND),
            self.config.clone(),
        )
    }

    async fn open<C>(&self, owner: ReplicaId) -> StoreResult<Persistent<C>>
    where
        C: Hydrate,
        C::State: Serialize + DeserializeOwned + Send + Sync + 'static,
    {
        Persistent::open(owner, self.typed_store::<C>()).await
    }

    /// Replicas with persisted state of one component kind.
    pub async fn stored_replicas<C>(&self) -> StoreResult<Vec<ReplicaId>>
    where
        C: Hydrate,
        C::State: Serialize + DeserializeOwned,
    {
        self.typed_store::<C>().replicas().await
    }

    /// Persistent grow-only counter.
    pub async fn g_counter(&self, owner: ReplicaId) -> StoreResult<Persistent<GCounter>> {
        self.open(owner).await
    }

    /// Persistent positive-negative counter.
    pub async fn pn_counter(&self, owner: ReplicaId) -> StoreResult<Persistent<PnCounter>> {
        self.open(owner).await
    }

    /// Persistent grow-only set.
    pub async fn g_set<A>(&self, owner: ReplicaId) -> StoreResult<Persistent<GSet<A>>>
    where
        A: Ord + Clone + Debug + Serialize + DeserializeOwned + Send + Sync + 'static,
    {
        self.open(owner).await
    }

    /// Persistent two-phase set.
    pub async fn two_p_set<A>(&self, owner: ReplicaId) -> StoreResult<Persistent<TwoPSet<A>>>
    where
        A: Ord + Clone + Debug + Serialize + DeserializeOwned + Send + Sync + 'static,
    {
        self.open(owner).await
    }

    /// Persistent observed-remove set.
    pub async fn or_set<A>(&self, owner: ReplicaId) -> StoreResult<Persistent<OrSet<A>>>
    where
        A: Ord + Clone + Debug + Serialize + DeserializeOwned + Send + Sync + 'static,
    {
        self.open(owner).await
    }

    /// Persistent last-writer-wins register.
    pub async fn lww_register<A>(&self, owner: ReplicaId) -> StoreResult<Persistent<LwwRegister<A>>>
    where
        A: Clone + Debug + Serialize + DeserializeOwned + Send + Sync + 'static,
    {
        self.open(owner).await
    }

    /// Persistent multi-value register.
    pub async fn mv_register<A>(&self, owner: ReplicaId) -> StoreResult<Persistent<MvRegister<A>>>
    where
        A: Clone + PartialEq + Debug + Serialize + DeserializeOwned + Send + Sync + 'static,
    {
        self.open(owner).await
    }

    /// Persistent last-writer-wins map.
    pub async fn lww_map<K, V>(&self, owner: ReplicaId) -> StoreResult<Persistent<LwwMap<K, V>>>
    where
        K: Ord + Clone + Debug + Serialize + DeserializeOwned + Send + Sync + 'static,
        V: Clone + Debug + Serialize + DeserializeOwned + Send + Sync + 'static,
    {
        self.open(owner).await
    }
}
