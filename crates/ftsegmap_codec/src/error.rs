//! Error types for the codec crate.

use thiserror::Error;

/// Result type for codec operations.
pub type CodecResult<T> = Result<T, CodecError>;

/// Errors that can occur during encoding or decoding.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CodecError {
    /// The encoded bytes are not a packed list.
    #[error("invalid packed list: {message}")]
    InvalidFormat {
        /// Description of the format issue.
        message: String,
    },

    /// The encoded bytes end before the data they declare.
    #[error("packed list truncated at byte {at}")]
    Truncated {
        /// Byte position where data was expected.
        at: usize,
    },

    /// A decode index was outside the list.
    #[error("index {index} out of bounds for packed list of length {len}")]
    IndexOutOfBounds {
        /// The requested index.
        index: usize,
        /// The list length.
        len: usize,
    },
}

impl CodecError {
    /// Creates an invalid format error.
    pub fn invalid_format(message: impl Into<String>) -> Self {
        Self::InvalidFormat {
            message: message.into(),
        }
    }
}
