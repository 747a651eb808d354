//! Error types for the storage crate.

/// Result type alias for storage operations.
pub type Result<T> = std::result::Result<T, StorageError>;

/// Reasons a write can be refused.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum StorageError {
    #[error("Value is empty")]
    EmptyValue,

    #[error("Value of {size} bytes exceeds the {limit} byte limit")]
    ValueTooLarge { size: usize, limit: usize },

    #[error("Storing {requested} more bytes would exceed the {limit} byte capacity ({used} used)")]
    CapacityExceeded {
        requested: usize,
        used: usize,
        limit: usize,
    },
}
