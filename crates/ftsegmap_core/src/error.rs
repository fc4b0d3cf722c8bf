//! Error types for ftsegmap core.

use thiserror::Error;

/// Result type for core operations.
pub type CoreResult<T> = Result<T, CoreError>;

/// Errors that can occur in core mapping operations.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Container error.
    #[error("storage error: {0}")]
    Storage(#[from] ftsegmap_storage::StorageError),

    /// Packed list codec error.
    #[error("codec error: {0}")]
    Codec(#[from] ftsegmap_codec::CodecError),

    /// A query needed the segment store while it was not mapped.
    #[error("segment store is not mapped")]
    StoreNotMapped,

    /// A store index did not fall inside any node's recorded range.
    #[error("store index {store_index} does not belong to any node")]
    InconsistentIndex {
        /// The store index that resolved to no node.
        store_index: usize,
    },

    /// The persisted mapping artifact is malformed.
    #[error("invalid mapping format: {message}")]
    InvalidFormat {
        /// Description of the format issue.
        message: String,
    },

    /// Operation not permitted in current state.
    #[error("invalid operation: {message}")]
    InvalidOperation {
        /// Description of why the operation is invalid.
        message: String,
    },
}

impl CoreError {
    /// Creates an invalid format error.
    pub fn invalid_format(message: impl Into<String>) -> Self {
        Self::InvalidFormat {
            message: message.into(),
        }
    }

    /// Creates an invalid operation error.
    pub fn invalid_operation(message: impl Into<String>) -> Self {
        Self::InvalidOperation {
            message: message.into(),
        }
    }
}
