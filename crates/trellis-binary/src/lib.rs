//! # Trellis Binary
//!
//! Storage for binary resource bodies, kept outside the RDF stores and
//! referenced from resource metadata by identifier only.
//!
//! ## Backends
//!
//! - [`FileBinaryService`] - sharded directory tree under a base path
//! - [`MemoryBinaryService`] - in-memory, for tests and embedding
//!
//! ## Usage
//!
//! ```rust,no_run
//! use trellis_binary::{BinaryService, FileBinaryService};
//! use trellis_core::{BinaryMetadata, DigestAlgorithm, Iri};
//!
//! async fn example() {
//!     let service = FileBinaryService::new("/var/lib/trellis/binaries").unwrap();
//!     let id = Iri::new(service.generate_identifier()).unwrap();
//!
//!     let metadata = BinaryMetadata::new(id).mime_type("text/plain");
//!     let digest = service
//!         .set_content_with_digest(&metadata, Box::new(&b"hello"[..]), DigestAlgorithm::Sha256)
//!         .await
//!         .unwrap();
//!     println!("stored {}", digest);
//! }
//! ```
//!
//! ## Design Notes
//!
//! - **Inline digests**: digests are computed while the bytes are written,
//!   never as a second pass.
//! - **Atomic replace**: readers see old or new content, never a mix.
//! - **Idempotent purge**: purging absent content succeeds.
//! - **Synchronous validation**: identifiers are checked before any I/O and
//!   fail as invalid arguments.

pub mod config;
pub mod digest_reader;
pub mod error;
pub mod file;
pub mod memory;
pub mod service;

pub use config::{FileBinaryConfig, DEFAULT_HIERARCHY, DEFAULT_LENGTH};
pub use digest_reader::{DigestHandle, DigestReader};
pub use error::{BinaryError, Result};
pub use file::{FileBinary, FileBinaryService, FILE_PREFIX};
pub use memory::{MemoryBinary, MemoryBinaryService};
pub use service::{Binary, BinaryReader, BinaryService};
