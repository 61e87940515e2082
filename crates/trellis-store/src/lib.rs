//! # Trellis Store
//!
//! Persistence for the RDF side of a resource, split across two
//! independently owned stores:
//!
//! - a **mutable** store holding the single current record per identifier
//!   ([`MutableDataService`]), and
//! - an **immutable** store accumulating quads per identifier, append-only
//!   ([`ImmutableDataService`]).
//!
//! Both are async and read through [`RetrievalService`]. Neither store knows
//! about the other; joining them is the resource service's job.
//!
//! ## Backends
//!
//! - [`SqliteMutableStore`] / [`SqliteImmutableStore`] - SQLite-backed, with
//!   versioned migrations
//! - [`MemoryMutableStore`] / [`MemoryImmutableStore`] - in-memory, for tests
//!   and embedding
//!
//! ## Usage
//!
//! ```rust,no_run
//! use trellis_core::{Dataset, Iri, Metadata};
//! use trellis_store::{MutableDataService, RetrievalService, SqliteMutableStore};
//!
//! async fn example() {
//!     let store = SqliteMutableStore::open("resources.db").unwrap();
//!     let id = Iri::new("trellis:data/resource").unwrap();
//!
//!     let metadata = Metadata::builder(id.clone()).build().unwrap();
//!     store.create(&metadata, &Dataset::new()).await.unwrap();
//!
//!     let resource = store.get(&id).await.unwrap();
//!     assert!(!resource.is_missing());
//! }
//! ```
//!
//! ## Design Notes
//!
//! - **Absence is not an error**: lookups return [`Resource::Missing`](trellis_core::Resource::Missing).
//! - **Rejections are errors**: a store that refuses a write returns
//!   [`StoreError::Rejected`].
//! - **Set semantics**: repeated appends of the same quad collapse.

pub mod error;
pub mod memory;
pub mod migration;
pub mod sqlite;
pub mod traits;

pub use error::{Result, StoreError};
pub use memory::{MemoryImmutableStore, MemoryMutableStore};
pub use sqlite::{SqliteImmutableStore, SqliteMutableStore};
pub use traits::{ImmutableDataService, MutableDataService, RetrievalService};
