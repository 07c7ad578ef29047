//! # Document Store Errors

use thiserror::Error;

/// Result type for document store operations
pub type DocumentResult<T> = Result<T, DocumentError>;

/// Document store errors
#[derive(Debug, Clone, Error)]
pub enum DocumentError {
    /// A record with the same unique key already exists in the collection
    #[error("Duplicate key in {collection}: {key}")]
    DuplicateKey { collection: String, key: String },

    /// Record is not a JSON object or lacks its unique key
    #[error("Invalid record in {collection}: {reason}")]
    InvalidRecord { collection: String, reason: String },

    #[error("Invalid collection name: {0}")]
    InvalidCollection(String),

    /// Operation exceeded its time budget
    #[error("Operation timed out after {0}s")]
    Timeout(u64),

    #[error("I/O error: {0}")]
    IoError(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl DocumentError {
    /// Whether this error came from the unique index
    pub fn is_duplicate_key(&self) -> bool {
        matches!(self, DocumentError::DuplicateKey { .. })
    }
}

impl From<serde_json::Error> for DocumentError {
    fn from(e: serde_json::Error) -> Self {
        DocumentError::Serialization(e.to_string())
    }
}

impl From<std::io::Error> for DocumentError {
    fn from(e: std::io::Error) -> Self {
        DocumentError::IoError(e.to_string())
    }
}
