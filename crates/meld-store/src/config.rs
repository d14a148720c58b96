//! Store configuration

use std::env;

/// Key layout configuration for typed stores.
///
/// Records are keyed `{namespace}:{kind}:{replica_id}`, so one backend
/// can hold the state of many libraries or deployments side by side.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreConfig {
    namespace: String,
}

impl StoreConfig {
    /// Create a config with an explicit namespace.
    pub fn new(namespace: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
        }
    }

    /// Read the namespace from `MELD_STORE_NAMESPACE`, falling back to
    /// the library default.
    pub fn from_env() -> Self {
        match env::var("MELD_STORE_NAMESPACE") {
            Ok(namespace) if !namespace.trim().is_empty() => Self::new(namespace.trim()),
            _ => Self::default(),
        }
    }

    /// The configured namespace.
    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    /// Full record key for a state kind and replica.
    pub fn record_key(&self, kind: &str, replica_id: &str) -> String {
        format!("{}:{}:{}", self.namespace, kind, replica_id)
    }
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self::new("meld")
    }
}
