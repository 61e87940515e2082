//! Error types for binary storage.

use std::io;

use thiserror::Error;
use trellis_core::{CoreError, DigestAlgorithm};

/// Errors that can occur during binary storage operations.
#[derive(Debug, Error)]
pub enum BinaryError {
    /// The identifier cannot be mapped to a storage location.
    #[error("invalid binary identifier {identifier}: {reason}")]
    InvalidIdentifier {
        identifier: String,
        reason: &'static str,
    },

    /// A caller supplied an argument that can never be valid.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// No content is stored at the identifier.
    #[error("no binary content at {0}")]
    NotFound(String),

    /// Filesystem failure while reading or writing content.
    #[error("storage I/O failure for {identifier}: {source}")]
    Io {
        identifier: String,
        #[source]
        source: io::Error,
    },

    /// The written bytes do not match a digest the caller declared.
    #[error("{algorithm} digest mismatch for {identifier}: expected {expected}, got {actual}")]
    DigestMismatch {
        identifier: String,
        algorithm: DigestAlgorithm,
        expected: String,
        actual: String,
    },

    /// The store cannot compute this digest.
    #[error("digest algorithm {0} is not supported by this store")]
    UnsupportedAlgorithm(DigestAlgorithm),

    /// The store is misconfigured.
    #[error("configuration error: {0}")]
    Config(String),

    /// A lock guarding store state was poisoned.
    #[error("binary store lock poisoned: {0}")]
    Poisoned(String),

    #[error(transparent)]
    Core(#[from] CoreError),
}

impl BinaryError {
    pub(crate) fn io(identifier: impl ToString) -> impl FnOnce(io::Error) -> BinaryError {
        let identifier = identifier.to_string();
        move |source| BinaryError::Io { identifier, source }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, BinaryError::NotFound(_))
    }

    pub fn is_invalid_argument(&self) -> bool {
        matches!(
            self,
            BinaryError::InvalidIdentifier { .. } | BinaryError::InvalidArgument(_)
        )
    }
}

/// Result type for binary storage operations.
pub type Result<T> = std::result::Result<T, BinaryError>;
