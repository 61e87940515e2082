//! In-memory implementations of the store traits.
//!
//! These have the same semantics as the SQLite stores but keep everything in
//! memory with no persistence.

use std::collections::{HashMap, HashSet};
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use async_trait::async_trait;
use trellis_core::{
    now_millis, Dataset, InteractionModel, Iri, Metadata, Resource, StoredResource,
};

use crate::error::{Result, StoreError};
use crate::traits::{has_acl, ImmutableDataService, MutableDataService, RetrievalService};

/// In-memory mutable store.
///
/// All data is lost when the store is dropped. Thread-safe via RwLock.
pub struct MemoryMutableStore {
    records: RwLock<HashMap<Iri, StoredResource>>,
    reserved: HashSet<Iri>,
}

impl MemoryMutableStore {
    /// Create a new empty store.
    pub fn new() -> Self {
        Self {
            records: RwLock::new(HashMap::new()),
            reserved: HashSet::new(),
        }
    }

    /// Reject every write to these identifiers.
    pub fn with_reserved(mut self, identifiers: impl IntoIterator<Item = Iri>) -> Self {
        self.reserved.extend(identifiers);
        self
    }

    /// Number of current records.
    pub fn len(&self) -> Result<usize> {
        Ok(self.read()?.len())
    }

    pub fn is_empty(&self) -> Result<bool> {
        Ok(self.read()?.is_empty())
    }

    fn check_reserved(&self, identifier: &Iri) -> Result<()> {
        if self.reserved.contains(identifier) {
            tracing::warn!(%identifier, "rejecting write to reserved identifier");
            return Err(StoreError::rejected(identifier, "identifier is reserved"));
        }
        Ok(())
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, HashMap<Iri, StoredResource>>> {
        self.records
            .read()
            .map_err(|e| StoreError::Poisoned(e.to_string()))
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, HashMap<Iri, StoredResource>>> {
        self.records
            .write()
            .map_err(|e| StoreError::Poisoned(e.to_string()))
    }
}

impl Default for MemoryMutableStore {
    fn default() -> Self {
        Self::new()
    }
}

fn record(metadata: &Metadata, dataset: &Dataset) -> StoredResource {
    StoredResource {
        identifier: metadata.identifier().clone(),
        interaction_model: metadata.interaction_model(),
        modified: now_millis(),
        container: metadata.container().cloned(),
        has_acl: has_acl(dataset),
        binary: metadata.binary().cloned(),
        quads: dataset.clone(),
    }
}

#[async_trait]
impl RetrievalService for MemoryMutableStore {
    async fn get(&self, identifier: &Iri) -> Result<Resource> {
        let records = self.read()?;
        Ok(records
            .get(identifier)
            .cloned()
            .map(Resource::Stored)
            .unwrap_or(Resource::Missing))
    }
}

#[async_trait]
impl MutableDataService for MemoryMutableStore {
    async fn create(&self, metadata: &Metadata, dataset: &Dataset) -> Result<()> {
        let identifier = metadata.identifier();
        self.check_reserved(identifier)?;

        let mut records = self.write()?;
        if records.contains_key(identifier) {
            return Err(StoreError::rejected(identifier, "a current record already exists"));
        }
        records.insert(identifier.clone(), record(metadata, dataset));
        Ok(())
    }

    async fn replace(&self, metadata: &Metadata, dataset: &Dataset) -> Result<()> {
        let identifier = metadata.identifier();
        self.check_reserved(identifier)?;

        self.write()?
            .insert(identifier.clone(), record(metadata, dataset));
        Ok(())
    }

    async fn delete(&self, metadata: &Metadata) -> Result<()> {
        let identifier = metadata.identifier();
        self.check_reserved(identifier)?;

        match self.write()?.remove(identifier) {
            Some(_) => Ok(()),
            None => Err(StoreError::rejected(identifier, "no current record")),
        }
    }

    async fn touch(&self, identifier: &Iri) -> Result<()> {
        self.check_reserved(identifier)?;

        match self.write()?.get_mut(identifier) {
            Some(record) => {
                record.modified = now_millis().max(record.modified);
                Ok(())
            }
            None => Err(StoreError::rejected(identifier, "no current record")),
        }
    }
}

struct History {
    quads: Dataset,
    modified: i64,
}

/// In-memory append-only store.
pub struct MemoryImmutableStore {
    history: RwLock<HashMap<Iri, History>>,
    reserved: HashSet<Iri>,
}

impl MemoryImmutableStore {
    /// Create a new empty store.
    pub fn new() -> Self {
        Self {
            history: RwLock::new(HashMap::new()),
            reserved: HashSet::new(),
        }
    }

    /// Reject every append to these identifiers.
    pub fn with_reserved(mut self, identifiers: impl IntoIterator<Item = Iri>) -> Self {
        self.reserved.extend(identifiers);
        self
    }
}

impl Default for MemoryImmutableStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl RetrievalService for MemoryImmutableStore {
    async fn get(&self, identifier: &Iri) -> Result<Resource> {
        let history = self
            .history
            .read()
            .map_err(|e| StoreError::Poisoned(e.to_string()))?;

        Ok(match history.get(identifier) {
            Some(entry) => Resource::Stored(StoredResource {
                identifier: identifier.clone(),
                interaction_model: InteractionModel::RdfSource,
                modified: entry.modified,
                container: None,
                has_acl: false,
                binary: None,
                quads: entry.quads.clone(),
            }),
            None => Resource::Missing,
        })
    }
}

#[async_trait]
impl ImmutableDataService for MemoryImmutableStore {
    async fn add(&self, identifier: &Iri, dataset: &Dataset) -> Result<()> {
        if self.reserved.contains(identifier) {
            tracing::warn!(%identifier, "rejecting append to reserved identifier");
            return Err(StoreError::rejected(identifier, "identifier is reserved"));
        }
        if dataset.is_empty() {
            return Ok(());
        }

        let mut history = self
            .history
            .write()
            .map_err(|e| StoreError::Poisoned(e.to_string()))?;

        let entry = history.entry(identifier.clone()).or_insert_with(|| History {
            quads: Dataset::new(),
            modified: 0,
        });
        entry.quads.extend_from(dataset);
        entry.modified = now_millis().max(entry.modified);
        Ok(())
    }
}
