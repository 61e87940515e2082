//! Error types for the store module.

use thiserror::Error;
use trellis_core::CoreError;

/// Errors that can occur during store operations.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The store refused the write.
    #[error("write rejected for {identifier}: {reason}")]
    Rejected { identifier: String, reason: String },

    /// Database error from SQLite.
    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// Quad or metadata encoding error.
    #[error("serialization error: {0}")]
    Serialization(String),

    /// Invalid data in storage.
    #[error("invalid data: {0}")]
    InvalidData(String),

    /// Migration error.
    #[error("migration error: {0}")]
    Migration(String),

    /// A lock guarding store state was poisoned.
    #[error("store lock poisoned: {0}")]
    Poisoned(String),

    /// A blocking task failed to complete.
    #[error("background task failed: {0}")]
    Task(String),

    /// Core value error (bad IRI, unknown interaction model, ...).
    #[error(transparent)]
    Core(#[from] CoreError),
}

impl StoreError {
    /// A rejected write.
    pub fn rejected(identifier: impl ToString, reason: impl Into<String>) -> Self {
        StoreError::Rejected {
            identifier: identifier.to_string(),
            reason: reason.into(),
        }
    }

    pub fn is_rejected(&self) -> bool {
        matches!(self, StoreError::Rejected { .. })
    }
}

/// Result type for store operations.
pub type Result<T> = std::result::Result<T, StoreError>;
