//! Store error types

use thiserror::Error;

/// Errors surfaced by the persistence adapter.
///
/// All variants are recoverable: callers decide whether to retry, fall
/// back to an empty state, or give up. Load failures at replica startup
/// are propagated; save failures on the shutdown path are logged and
/// swallowed so they cannot mask the primary exit.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum StoreError {
    /// Backend failed to read a record
    #[error("Load error: {0}")]
    Load(String),

    /// Backend failed to write a record
    #[error("Save error: {0}")]
    Save(String),

    /// Backend failed to delete a record
    #[error("Delete error: {0}")]
    Delete(String),

    /// Encoding or decoding a typed state failed
    #[error("Schema error: {0}")]
    Schema(String),
}

impl StoreError {
    /// Fold a schema failure into the load side of the boundary.
    pub fn into_load(self) -> StoreError {
        match self {
            StoreError::Schema(message) => StoreError::Load(message),
            other => other,
        }
    }

    /// Fold a schema failure into the save side of the boundary.
    pub fn into_save(self) -> StoreError {
        match self {
            StoreError::Schema(message) => StoreError::Save(message),
            other => other,
        }
    }
}

/// Result type for store operations
pub type StoreResult<T> = Result<T, StoreError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_schema_errors_fold_into_the_boundary_side() {
        let schema = StoreError::Schema("bad field".into());
        assert_eq!(schema.clone().into_load(), StoreError::Load("bad field".into()));
        assert_eq!(schema.into_save(), StoreError::Save("bad field".into()));

        // Non-schema errors pass through untouched
        let delete = StoreError::Delete("gone".into());
        assert_eq!(delete.clone().into_load(), delete);
    }

    #[test]
    fn test_display_prefixes_the_failure_kind() {
        assert_eq!(
            StoreError::Load("backend down".into()).to_string(),
            "Load error: backend down"
        );
        assert_eq!(
            StoreError::Save("disk full".into()).to_string(),
            "Save error: disk full"
        );
    }
}
