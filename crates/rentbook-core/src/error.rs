//! Error types for the reconciliation engine and its directories
//!
//! Every error aborts the enclosing storage transaction, so a caller that
//! receives one can rely on stored state being unchanged.

use rentbook_storage::StorageError;
use thiserror::Error;

/// Main error type for ledger operations
#[derive(Error, Debug)]
pub enum LedgerError {
    /// A referenced agreement, asset, renter or payment does not exist
    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: String },

    /// The operation would violate a uniqueness rule (asset already bound,
    /// duplicate plate number, record still referenced)
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Payment amount is not positive or exceeds what is still owed
    #[error("Invalid amount: {0}")]
    InvalidAmount(String),

    /// Malformed or missing input field
    #[error("Validation error: {0}")]
    Validation(String),

    /// Persistence backend failure
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    /// A stored record could not be encoded or decoded
    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl LedgerError {
    /// Create a not-found error
    pub fn not_found(entity: &'static str, id: impl ToString) -> Self {
        LedgerError::NotFound {
            entity,
            id: id.to_string(),
        }
    }

    /// Create a conflict error
    pub fn conflict(msg: impl Into<String>) -> Self {
        LedgerError::Conflict(msg.into())
    }

    /// Create an invalid-amount error
    pub fn invalid_amount(msg: impl Into<String>) -> Self {
        LedgerError::InvalidAmount(msg.into())
    }

    /// Create a validation error
    pub fn validation(msg: impl Into<String>) -> Self {
        LedgerError::Validation(msg.into())
    }

    /// Stable machine-readable code
    pub fn code(&self) -> &'static str {
        match self {
            LedgerError::NotFound { .. } => "NOT_FOUND",
            LedgerError::Conflict(_) => "CONFLICT",
            LedgerError::InvalidAmount(_) => "INVALID_AMOUNT",
            LedgerError::Validation(_) => "VALIDATION_ERROR",
            LedgerError::Storage(_) => "STORAGE_ERROR",
            LedgerError::Serialization(_) => "SERIALIZATION_ERROR",
        }
    }

    /// Check if this error was caused by the caller's input (vs internal)
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            LedgerError::NotFound { .. }
                | LedgerError::Conflict(_)
                | LedgerError::InvalidAmount(_)
                | LedgerError::Validation(_)
        )
    }
}

impl From<serde_json::Error> for LedgerError {
    fn from(err: serde_json::Error) -> Self {
        LedgerError::Serialization(err.to_string())
    }
}

/// Result type alias for ledger operations
pub type LedgerResult<T> = std::result::Result<T, LedgerError>;
