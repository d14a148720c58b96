//! Backend-agnostic storage trait

use async_trait::async_trait;

use crate::error::StoreResult;

/// Storage backend for CRDT snapshots.
///
/// Backends see only opaque string records keyed by opaque string keys;
/// typed encoding and key layout live above this trait in `TypedStore`.
/// Implementations must be safe to share across tasks.
#[async_trait]
pub trait StateStore: Send + Sync {
    /// Read a record, `None` when the key has never been written.
    async fn load_raw(&self, key: &str) -> StoreResult<Option<String>>;

    /// Write a record, replacing any previous value.
    async fn save_raw(&self, key: &str, value: &str) -> StoreResult<()>;

    /// Delete a record; deleting a missing key is not an error.
    async fn delete_raw(&self, key: &str) -> StoreResult<()>;

    /// List keys, optionally restricted to a prefix.
    async fn list_raw(&self, prefix: Option<&str>) -> StoreResult<Vec<String>>;
}
