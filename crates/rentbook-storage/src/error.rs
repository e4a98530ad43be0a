//! Error types for the storage layer

use thiserror::Error;

/// Errors raised by a [`Store`](crate::Store) backend
#[derive(Error, Debug)]
pub enum StorageError {
    /// Backend-specific failure (sled internal error, corrupted tree, ...)
    #[error("Storage backend error: {0}")]
    Backend(String),

    /// I/O error while opening or flushing an on-disk store
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A stored record could not be decoded
    #[error("Corrupt record in {table}: {message}")]
    Corrupt { table: String, message: String },

    /// Another transaction touched the same keys; the backend retries
    #[error("Transaction conflict")]
    Conflict,

    /// A lock guarding the in-memory store was poisoned by a panicking writer
    #[error("Storage lock poisoned")]
    LockPoisoned,
}

impl StorageError {
    /// Create a corrupt-record error
    pub fn corrupt(table: impl Into<String>, message: impl Into<String>) -> Self {
        StorageError::Corrupt {
            table: table.into(),
            message: message.into(),
        }
    }
}

impl From<sled::Error> for StorageError {
    fn from(err: sled::Error) -> Self {
        match err {
            sled::Error::Io(io) => StorageError::Io(io),
            other => StorageError::Backend(other.to_string()),
        }
    }
}

/// Result type for storage operations
pub type StorageResult<T> = std::result::Result<T, StorageError>;
