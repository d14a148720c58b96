//! In-memory storage backend
//!
//! Useful for testing and for single-process deployments that only need
//! persistence across replica handles, not across process restarts.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::error::StoreResult;
use crate::store::StateStore;

/// Process-memory backend over a shared hash map.
///
/// Cloning shares the underlying map, so every handle minted from one
/// `MemoryStore` sees the same records.
#[derive(Debug, Default, Clone)]
pub struct MemoryStore {
    records: Arc<RwLock<HashMap<String, String>>>,
}

impl MemoryStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of records currently held.
    pub async fn len(&self) -> usize {
        self.records.read().await.len()
    }

    /// True when no records are held.
    pub async fn is_empty(&self) -> bool {
        self.records.read().await.is_empty()
    }

    /// Drop every record.
    pub async fn clear(&self) {
        self.records.write().await.clear();
    }
}

#[async_trait]
impl StateStore for MemoryStore {
    async fn load_raw(&self, key: &str) -> StoreResult<Option<String>> {
        let records = self.records.read().await;
        Ok(records.get(key).cloned())
    }

    async fn save_raw(&self, key: &str, value: &str) -> StoreResult<()> {
        let mut records = self.records.write().await;
        records.insert(key.to_string(), value.to_string());
        Ok(())
    }

    async fn delete_raw(&self, key: &str) -> StoreResult<()> {
        let mut records = self.records.write().await;
        records.remove(key);
        Ok(())
    }

    async fn list_raw(&self, prefix: Option<&str>) -> StoreResult<Vec<String>> {
        let records = self.records.read().await;
        let mut keys: Vec<String> = records
            .keys()
            .filter(|key| prefix.map_or(true, |p| key.starts_with(p)))
            .cloned()
            .collect();
        keys.sort();
        Ok(keys)
    }
}
