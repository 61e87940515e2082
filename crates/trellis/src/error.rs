//! Error types for the resource service.

use thiserror::Error;
use trellis_binary::BinaryError;
use trellis_core::{CoreError, InteractionModel};
use trellis_store::StoreError;

/// Coarse classification of a failure, for mapping to status codes at the
/// HTTP or CLI boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// A store refused the write.
    RejectedWrite,
    /// Content that must exist does not. Resource lookups never produce this;
    /// they return [`Resource::Missing`](trellis_core::Resource::Missing).
    NotFound,
    /// Filesystem or database failure.
    StorageIo,
    /// The caller passed something that can never be valid.
    InvalidArgument,
    /// The operation is not defined for this variant or algorithm.
    Unsupported,
    /// The service is misconfigured.
    Configuration,
}

/// Errors that can occur during resource service operations.
#[derive(Debug, Error)]
pub enum TrellisError {
    /// Mutable or immutable store failure.
    #[error("store error: {0}")]
    Store(#[from] StoreError),

    /// Binary storage failure.
    #[error("binary error: {0}")]
    Binary(#[from] BinaryError),

    /// Core value error.
    #[error(transparent)]
    Core(#[from] CoreError),

    /// The service does not accept this interaction model.
    #[error("interaction model {model} is not supported for {identifier}")]
    UnsupportedInteractionModel {
        identifier: String,
        model: InteractionModel,
    },

    /// Invalid or incomplete configuration.
    #[error("configuration error: {0}")]
    Config(String),
}

impl TrellisError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            TrellisError::Store(e) => store_kind(e),
            TrellisError::Binary(e) => binary_kind(e),
            TrellisError::Core(e) => core_kind(e),
            TrellisError::UnsupportedInteractionModel { .. } => ErrorKind::RejectedWrite,
            TrellisError::Config(_) => ErrorKind::Configuration,
        }
    }
}

fn core_kind(e: &CoreError) -> ErrorKind {
    match e {
        CoreError::InvalidIri { .. } | CoreError::InvalidArgument(_) => ErrorKind::InvalidArgument,
        CoreError::Unsupported { .. } | CoreError::UnsupportedAlgorithm(_) => ErrorKind::Unsupported,
    }
}

fn store_kind(e: &StoreError) -> ErrorKind {
    match e {
        StoreError::Rejected { .. } => ErrorKind::RejectedWrite,
        StoreError::Core(core) => core_kind(core),
        StoreError::Database(_)
        | StoreError::Serialization(_)
        | StoreError::InvalidData(_)
        | StoreError::Migration(_)
        | StoreError::Poisoned(_)
        | StoreError::Task(_) => ErrorKind::StorageIo,
    }
}

fn binary_kind(e: &BinaryError) -> ErrorKind {
    match e {
        BinaryError::InvalidIdentifier { .. } | BinaryError::InvalidArgument(_) => {
            ErrorKind::InvalidArgument
        }
        BinaryError::NotFound(_) => ErrorKind::NotFound,
        BinaryError::Io { .. } | BinaryError::Poisoned(_) => ErrorKind::StorageIo,
        BinaryError::DigestMismatch { .. } => ErrorKind::RejectedWrite,
        BinaryError::UnsupportedAlgorithm(_) => ErrorKind::Unsupported,
        BinaryError::Config(_) => ErrorKind::Configuration,
        BinaryError::Core(core) => core_kind(core),
    }
}

/// Result type for resource service operations.
pub type Result<T> = std::result::Result<T, TrellisError>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;
    use trellis_core::DigestAlgorithm;

    #[test]
    fn test_kinds_are_distinguishable() {
        let rejected = TrellisError::from(StoreError::rejected("http://bad.com", "reserved"));
        let not_found = TrellisError::from(BinaryError::NotFound("file:///ab/ab".into()));
        let invalid = TrellisError::from(BinaryError::InvalidIdentifier {
            identifier: "http://x".into(),
            reason: "expected a file: identifier",
        });
        let io = TrellisError::from(BinaryError::Io {
            identifier: "file:///ab/ab".into(),
            source: io::Error::new(io::ErrorKind::PermissionDenied, "denied"),
        });

        assert_eq!(rejected.kind(), ErrorKind::RejectedWrite);
        assert_eq!(not_found.kind(), ErrorKind::NotFound);
        assert_eq!(invalid.kind(), ErrorKind::InvalidArgument);
        assert_eq!(io.kind(), ErrorKind::StorageIo);
    }

    #[test]
    fn test_nested_core_errors_keep_their_kind() {
        let unsupported = CoreError::Unsupported {
            operation: "has_acl",
            variant: "draft",
        };
        assert_eq!(
            TrellisError::from(StoreError::from(unsupported)).kind(),
            ErrorKind::Unsupported
        );
        assert_eq!(
            TrellisError::from(BinaryError::UnsupportedAlgorithm(DigestAlgorithm::Blake3)).kind(),
            ErrorKind::Unsupported
        );
    }

    #[test]
    fn test_cause_is_preserved() {
        use std::error::Error as _;

        let err = TrellisError::from(BinaryError::Io {
            identifier: "file:///ab/ab".into(),
            source: io::Error::new(io::ErrorKind::Other, "disk on fire"),
        });
        let source = err.source().unwrap();
        assert!(source.to_string().contains("file:///ab/ab"));
        assert!(source.source().unwrap().to_string().contains("disk on fire"));
    }
}
