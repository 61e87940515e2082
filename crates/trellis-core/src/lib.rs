//! # Trellis Core
//!
//! Pure primitives for the Trellis persistence layer: identifiers, quads,
//! resources, and digests.
//!
//! This crate contains no I/O, no storage, no async. Stores and binary
//! services build on these types.
//!
//! ## Key Types
//!
//! - [`Iri`] - A validated, scheme-bearing identifier
//! - [`Quad`] / [`Dataset`] - RDF statements with set semantics
//! - [`Resource`] - The closed set of resource variants (stored, merged, draft, missing)
//! - [`Metadata`] / [`BinaryMetadata`] - Descriptions of a pending write
//! - [`DigestAlgorithm`] / [`Digest`] - Content digests computed over binaries
//! - [`IdentifierGenerator`] - Hierarchy-aware identifier minting

pub mod digest;
pub mod error;
pub mod identifier;
pub mod iri;
pub mod metadata;
pub mod model;
pub mod rdf;
pub mod resource;

pub use digest::{Digest, DigestAlgorithm, Hasher};
pub use error::{CoreError, Result};
pub use identifier::{random_token, IdentifierGenerator, TOKEN_LENGTH};
pub use iri::{trim_leading, Iri};
pub use metadata::{BinaryMetadata, Metadata, MetadataBuilder};
pub use model::InteractionModel;
pub use rdf::{graphs, Dataset, Quad, Term};
pub use resource::{
    merge, now_millis, DraftResource, MergedResource, Resource, ResourceVariant, StoredResource,
};
