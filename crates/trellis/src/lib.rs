//! # Trellis
//!
//! The persistence core of a Linked Data Platform server: resource state
//! split across a mutable and an immutable store and joined at read time,
//! plus storage for binary bodies.
//!
//! ## Overview
//!
//! - **Mutable store**: the single current record of each resource
//! - **Immutable store**: append-only quads per resource, never overwritten
//! - **Joining service**: one create/replace/delete/get surface over both
//! - **Binary store**: large bodies on a sharded filesystem, digested inline
//!
//! ## Key Concepts
//!
//! - **Merged resource**: scalar state from the mutable side, quads from
//!   both sides as a set union.
//! - **Missing**: absence is a value, never an error.
//! - **Weak consistency**: the stores are not transactionally coupled, and a
//!   failed multi-store write may be partially applied.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use trellis::{JoiningResourceService, ResourceService, TrellisConfig};
//! use trellis::core::{Dataset, Iri, Metadata};
//!
//! async fn example() {
//!     let config = TrellisConfig::load_from_path("trellis.toml").unwrap();
//!     let (mutable, immutable) = config.open_stores().unwrap();
//!     let service = JoiningResourceService::new(mutable, immutable);
//!
//!     let id = Iri::new(service.generate_identifier()).unwrap();
//!     let metadata = Metadata::builder(id.clone()).build().unwrap();
//!     service.create(&metadata, &Dataset::new()).await.unwrap();
//!
//!     let resource = service.get(&id).await.unwrap();
//!     assert!(!resource.is_missing());
//! }
//! ```
//!
//! ## Re-exports
//!
//! - `trellis::core` - Identifiers, quads, resources, digests
//! - `trellis::store` - Mutable and immutable stores
//! - `trellis::binary` - Binary content storage

pub mod config;
pub mod error;
pub mod resource_service;

// Re-export component crates
pub use trellis_binary as binary;
pub use trellis_core as core;
pub use trellis_store as store;

pub use config::{StoreConfig, TrellisConfig};
pub use error::{ErrorKind, Result, TrellisError};
pub use resource_service::{JoiningResourceService, ResourceService, RESOURCE_PREFIX};

// Re-export commonly used types
pub use trellis_binary::{Binary, BinaryService, FileBinaryService, MemoryBinaryService};
pub use trellis_core::{
    BinaryMetadata, Dataset, Digest, DigestAlgorithm, InteractionModel, Iri, Metadata, Quad,
    Resource, Term,
};
