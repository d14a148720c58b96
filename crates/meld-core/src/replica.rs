//! Replica identifiers

use std::fmt;

use serde::{Deserialize, Serialize};

/// Unique identifier for a replica.
///
/// Equality is byte equality on the underlying string and the derived
/// ordering is lexicographic, so two processes always agree on which of
/// two replicas is "greater". LWW-Register and LWW-Map rely on this to
/// break ties between concurrent writers.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ReplicaId(String);

impl ReplicaId {
    /// Create a new replica ID.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Get the ID as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ReplicaId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for ReplicaId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

impl From<String> for ReplicaId {
    fn from(id: String) -> Self {
        Self(id)
    }
}
