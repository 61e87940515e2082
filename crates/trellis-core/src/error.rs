//! Error types for Trellis Core.

use thiserror::Error;

/// Errors raised by core value types.
#[derive(Debug, Error)]
pub enum CoreError {
    /// The string is not a usable IRI.
    #[error("invalid IRI {value:?}: {reason}")]
    InvalidIri { value: String, reason: &'static str },

    /// A caller supplied an argument that can never be valid.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// The operation is not defined for this resource variant.
    #[error("{operation} is not supported by {variant} resources")]
    Unsupported {
        operation: &'static str,
        variant: &'static str,
    },

    /// The named digest algorithm is not known.
    #[error("unsupported digest algorithm: {0}")]
    UnsupportedAlgorithm(String),
}

/// Result type for core operations.
pub type Result<T> = std::result::Result<T, CoreError>;
