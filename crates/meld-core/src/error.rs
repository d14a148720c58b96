//! Core error types

use thiserror::Error;

/// Errors raised by CRDT mutators.
///
/// Both variants are fatal to the operation that raised them: the
/// surrounding `TxCell` transaction aborts and the published state is
/// left untouched.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum CrdtError {
    /// Argument outside the operation's domain (e.g. counter overflow)
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// Operation not defined for this CRDT variant
    #[error("Operation not supported: {0}")]
    OperationNotSupported(String),
}

/// Result type for CRDT operations
pub type CrdtResult<T> = Result<T, CrdtError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_carries_the_diagnostic() {
        let invalid = CrdtError::InvalidArgument("increment overflows".into());
        assert_eq!(invalid.to_string(), "Invalid argument: increment overflows");

        let unsupported = CrdtError::OperationNotSupported("decrement".into());
        assert_eq!(unsupported.to_string(), "Operation not supported: decrement");
    }
}
