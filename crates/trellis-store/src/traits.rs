//! Store traits: the abstract interfaces for resource persistence.
//!
//! These traits let the resource service stay storage-agnostic.
//! Implementations include SQLite and in-memory backends.

use async_trait::async_trait;
use trellis_core::{graphs, Dataset, Iri, Metadata, Resource};

use crate::error::Result;

/// Async point lookup of a resource by identifier.
///
/// Returns [`Resource::Missing`] when nothing exists. Errors are reserved for
/// store failures.
#[async_trait]
pub trait RetrievalService: Send + Sync {
    async fn get(&self, identifier: &Iri) -> Result<Resource>;
}

/// Authoritative store of the current record of each resource.
///
/// # Design Notes
///
/// - `create` is rejected when a current record already exists.
/// - `replace` overwrites, creating the record if needed.
/// - `delete` is rejected when no current record exists.
/// - Any write may be rejected by store policy (reserved identifiers, ...).
#[async_trait]
pub trait MutableDataService: RetrievalService {
    /// Persist a new current record.
    async fn create(&self, metadata: &Metadata, dataset: &Dataset) -> Result<()>;

    /// Overwrite the current record.
    async fn replace(&self, metadata: &Metadata, dataset: &Dataset) -> Result<()>;

    /// Remove the current record.
    async fn delete(&self, metadata: &Metadata) -> Result<()>;

    /// Re-stamp the current record's modification time.
    async fn touch(&self, identifier: &Iri) -> Result<()>;
}

/// Append-only store of quads per identifier.
///
/// Successive `add` calls accumulate; duplicate quads collapse. Appending an
/// empty dataset records nothing.
#[async_trait]
pub trait ImmutableDataService: RetrievalService {
    async fn add(&self, identifier: &Iri, dataset: &Dataset) -> Result<()>;
}

/// Whether a dataset carries access-control statements.
pub fn has_acl(dataset: &Dataset) -> bool {
    dataset.has_graph(graphs::PREFER_ACCESS_CONTROL)
}
