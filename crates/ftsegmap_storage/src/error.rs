//! Error types for container operations.

use std::io;
use thiserror::Error;

/// Result type for container operations.
pub type StorageResult<T> = Result<T, StorageError>;

/// Errors that can occur during container operations.
#[derive(Debug, Error)]
pub enum StorageError {
    /// An I/O error occurred.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// The container file is malformed.
    #[error("invalid container format: {message}")]
    InvalidFormat {
        /// Description of the format issue.
        message: String,
    },

    /// A requested section does not exist in the container.
    #[error("section not found: {name}")]
    SectionNotFound {
        /// Name of the missing section.
        name: String,
    },

    /// A section with this name was already written.
    #[error("duplicate section: {name}")]
    DuplicateSection {
        /// Name of the duplicated section.
        name: String,
    },

    /// Attempted to read beyond the end of a section.
    #[error("read beyond end of section {name}: offset {offset}, len {len}, section size {size}")]
    ReadPastEnd {
        /// Name of the section.
        name: String,
        /// The requested read offset within the section.
        offset: u64,
        /// The requested read length.
        len: usize,
        /// The section size.
        size: u64,
    },
}

impl StorageError {
    /// Creates an invalid format error.
    pub fn invalid_format(message: impl Into<String>) -> Self {
        Self::InvalidFormat {
            message: message.into(),
        }
    }

    /// Creates a section not found error.
    pub fn section_not_found(name: impl Into<String>) -> Self {
        Self::SectionNotFound { name: name.into() }
    }
}
