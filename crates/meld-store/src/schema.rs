//! Typed views over the raw byte store
//!
//! A `StateSchema` names a state kind and carries its JSON codec; a
//! `TypedStore` couples a schema with a backend and a key layout and
//! exposes the load/save/delete surface the replica wiring consumes.
//! Codec failures surface as `StoreError::Schema` from the schema itself
//! and are folded into the load/save side at the typed boundary.

use std::marker::PhantomData;
use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::debug;

use meld_core::ReplicaId;

use crate::config::StoreConfig;
use crate::error::{StoreError, StoreResult};
use crate::store::StateStore;

/// Codec for one CRDT state type.
///
/// The `kind` tag becomes part of the record key, separating, say, a
/// replica's G-Counter record from its OR-Set record.
#[derive(Debug)]
pub struct StateSchema<T> {
    kind: &'static str,
    _marker: PhantomData<fn() -> T>,
}

impl<T> Clone for StateSchema<T> {
    fn clone(&self) -> Self {
        Self {
            kind: self.kind,
            _marker: PhantomData,
        }
    }
}

impl<T: Serialize + DeserializeOwned> StateSchema<T> {
    /// Create a schema for states tagged `kind`.
    pub fn new(kind: &'static str) -> Self {
        Self {
            kind,
            _marker: PhantomData,
        }
    }

    /// The state kind tag.
    pub fn kind(&self) -> &'static str {
        self.kind
    }

    /// Encode a state to its record representation.
    pub fn encode(&self, state: &T) -> StoreResult<String> {
        serde_json::to_string(state)
            .map_err(|error| StoreError::Schema(format!("encode {}: {error}", self.kind)))
    }

    /// Decode a state from its record representation.
    pub fn decode(&self, record: &str) -> StoreResult<T> {
        serde_json::from_str(record)
            .map_err(|error| StoreError::Schema(format!("decode {}: {error}", self.kind)))
    }
}

/// Typed persistence for one CRDT state type over any backend.
pub struct TypedStore<T> {
    backend: Arc<dyn StateStore>,
    schema: StateSchema<T>,
    config: StoreConfig,
}

impl<T> Clone for TypedStore<T> {
    fn clone(&self) -> Self {
        Self {
            backend: Arc::clone(&self.backend),
            schema: self.schema.clone(),
            config: self.config.clone(),
        }
    }
}

impl<T: Serialize + DeserializeOwned> TypedStore<T> {
    /// Couple a backend, a schema, and a key layout.
    pub fn new(backend: Arc<dyn StateStore>, schema: StateSchema<T>, config: StoreConfig) -> Self {
        Self {
            backend,
            schema,
            config,
        }
    }

    /// The state kind this store persists.
    pub fn kind(&self) -> &'static str {
        self.schema.kind()
    }

    fn key(&self, replica_id: &ReplicaId) -> String {
        self.config.record_key(self.schema.kind(), replica_id.as_str())
    }

    /// Load the persisted state for a replica, `None` when absent.
    pub async fn load(&self, replica_id: &ReplicaId) -> StoreResult<Option<T>> {
        let key = self.key(replica_id);
        let record = self.backend.load_raw(&key).await?;
        debug!(key = %key, found = record.is_some(), "loaded state record");

        match record {
            None => Ok(None),
            Some(record) => {
                let state = self
                    .schema
                    .decode(&record)
                    .map_err(StoreError::into_load)?;
                Ok(Some(state))
            }
        }
    }

    /// Persist the state for a replica.
    pub async fn save(&self, replica_id: &ReplicaId, state: &T) -> StoreResult<()> {
        let key = self.key(replica_id);
        let record = self.schema.encode(state).map_err(StoreError::into_save)?;
        self.backend.save_raw(&key, &record).await?;
        debug!(key = %key, bytes = record.len(), "saved state record");
        Ok(())
    }

    /// Delete the persisted state for a replica.
    pub async fn delete(&self, replica_id: &ReplicaId) -> StoreResult<()> {
        let key = self.key(replica_id);
        self.backend.delete_raw(&key).await?;
        debug!(key = %key, "deleted state record");
        Ok(())
    }

    /// Replicas with a persisted record of this kind.
    pub async fn replicas(&self) -> StoreResult<Vec<ReplicaId>> {
        let prefix = self.config.record_key(self.schema.kind(), "");
        let keys = self.backend.list_raw(Some(&prefix)).await?;
        Ok(keys
            .iter()
            .filter_map(|key| key.strip_prefix(&prefix))
            .map(ReplicaId::new)
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::MemoryStore;
    use serde::Deserialize;

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    struct Sample {
        name: String,
        count: u64,
    }

    fn typed_store() -> TypedStore<Sample> {
        TypedStore::new(
            Arc::new(MemoryStore::new()),
            StateSchema::new("sample"),
            StoreConfig::new("test"),
        )
    }

    #[tokio::test]
    async fn test_missing_record_loads_as_none() {
        let store = typed_store();
        let loaded = store.load(&ReplicaId::new("r1")).await.unwrap();
        assert_eq!(loaded, None);
    }

    #[tokio::test]
    async fn test_save_load_round_trip() {
        let store = typed_store();
        let replica = ReplicaId::new("r1");
        let state = Sample {
            name: "x".into(),
            count: 3,
        };

        store.save(&replica, &state).await.unwrap();
        assert_eq!(store.load(&replica).await.unwrap(), Some(state));
    }

    #[tokio::test]
    async fn test_delete_removes_record() {
        let store = typed_store();
        let replica = ReplicaId::new("r1");
        store
            .save(&replica, &Sample { name: "x".into(), count: 1 })
            .await
            .unwrap();

        store.delete(&replica).await.unwrap();
        assert_eq!(store.load(&replica).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_garbage_record_surfaces_load_error() {
        let backend = Arc::new(MemoryStore::new());
        let store = TypedStore::<Sample>::new(
            Arc::clone(&backend) as Arc<dyn StateStore>,
            StateSchema::new("sample"),
            StoreConfig::new("test"),
        );

        backend
            .save_raw("test:sample:r1", "{not valid json")
            .await
            .unwrap();

        let error = store.load(&ReplicaId::new("r1")).await.unwrap_err();
        assert!(matches!(error, StoreError::Load(_)));
    }

    #[tokio::test]
    async fn test_replicas_lists_only_this_kind() {
        let backend = Arc::new(MemoryStore::new());
        let samples = TypedStore::<Sample>::new(
            Arc::clone(&backend) as Arc<dyn StateStore>,
            StateSchema::new("sample"),
            StoreConfig::new("test"),
        );
        let others = TypedStore::<Sample>::new(
            Arc::clone(&backend) as Arc<dyn StateStore>,
            StateSchema::new("other"),
            StoreConfig::new("test"),
        );

        let state = Sample { name: "x".into(), count: 0 };
        samples.save(&ReplicaId::new("r1"), &state).await.unwrap();
        samples.save(&ReplicaId::new("r2"), &state).await.unwrap();
        others.save(&ReplicaId::new("r3"), &state).await.unwrap();

        let replicas = samples.replicas().await.unwrap();
        assert_eq!(replicas, vec![ReplicaId::new("r1"), ReplicaId::new("r2")]);
    }

    #[tokio::test]
    async fn test_replicas_do_not_collide() {
        let store = typed_store();
        let one = Sample { name: "one".into(), count: 1 };
        let two = Sample { name: "two".into(), count: 2 };

        store.save(&ReplicaId::new("r1"), &one).await.unwrap();
        store.save(&ReplicaId::new("r2"), &two).await.unwrap();

        assert_eq!(store.load(&ReplicaId::new("r1")).await.unwrap(), Some(one));
        assert_eq!(store.load(&ReplicaId::new("r2")).await.unwrap(), Some(two));
    }
}
