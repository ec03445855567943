//! Error types for the storage layer.

use keystone_events::PublishError;
use thiserror::Error;

/// Result type for storage operations.
pub type StorageResult<T> = Result<T, StorageError>;

/// Errors that can occur in storage operations.
#[derive(Debug, Error)]
pub enum StorageError {
    /// Entity not found.
    #[error("entity not found: {0}")]
    NotFound(String),

    /// An entity or table with the same identity already exists.
    #[error("already exists: {0}")]
    Duplicate(String),

    /// The backing store cannot be reached.
    #[error("store unavailable: {0}")]
    Unavailable(String),

    /// The mutation was persisted but publishing its event failed.
    #[error("event publish failed after write: {0}")]
    Publish(#[from] PublishError),
}
