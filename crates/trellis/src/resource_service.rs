//! The resource service: one persistence surface over two stores.
//!
//! Writes of the current record go to the mutable store; history is appended
//! to the immutable store; reads query both concurrently and merge.
//!
//! ## Consistency
//!
//! The two stores are not transactionally coupled. A multi-store write such
//! as [`ResourceService::create_with_history`] can fail halfway, leaving the
//! first write applied. No rollback is attempted and nothing is retried;
//! reconciliation is the caller's responsibility.
//!
//! Deleting a resource removes only its current record. Immutable history is
//! permanent, so after a delete `get` returns an immutable-only merged
//! resource if history exists, and [`Resource::Missing`] otherwise.

use std::collections::BTreeSet;
use std::sync::Arc;

use async_trait::async_trait;
use trellis_core::{merge, Dataset, IdentifierGenerator, InteractionModel, Iri, Metadata, Resource};
use trellis_store::{ImmutableDataService, MutableDataService};

use crate::error::{Result, TrellisError};

/// Identifier prefix for resources minted by the service.
pub const RESOURCE_PREFIX: &str = "trellis:data/";

/// Resource persistence as seen by the HTTP layer.
#[async_trait]
pub trait ResourceService: Send + Sync {
    /// The merged view of `identifier`. Absence yields [`Resource::Missing`].
    async fn get(&self, identifier: &Iri) -> Result<Resource>;

    /// Write a new current record. Rejected if one exists.
    async fn create(&self, metadata: &Metadata, dataset: &Dataset) -> Result<()>;

    /// Overwrite the current record.
    async fn replace(&self, metadata: &Metadata, dataset: &Dataset) -> Result<()>;

    /// Remove the current record. History is kept.
    async fn delete(&self, metadata: &Metadata) -> Result<()>;

    /// Append quads to the history of `identifier`.
    async fn add(&self, identifier: &Iri, dataset: &Dataset) -> Result<()>;

    /// Re-stamp the modification time of the current record.
    async fn touch(&self, identifier: &Iri) -> Result<()>;

    /// Create the current record, then append `history`.
    ///
    /// The append is only issued once the create has succeeded. If the
    /// append fails the created record stays in place.
    async fn create_with_history(
        &self,
        metadata: &Metadata,
        dataset: &Dataset,
        history: &Dataset,
    ) -> Result<()> {
        self.create(metadata, dataset).await?;
        if let Err(e) = self.add(metadata.identifier(), history).await {
            tracing::warn!(
                identifier = %metadata.identifier(),
                error = %e,
                "history append failed after create; current record kept"
            );
            return Err(e);
        }
        Ok(())
    }

    /// Interaction models `create` and `replace` accept.
    fn supported_interaction_models(&self) -> &BTreeSet<InteractionModel>;

    /// Mint a fresh resource identifier.
    fn generate_identifier(&self) -> String;
}

/// A [`ResourceService`] joining a mutable and an immutable store.
pub struct JoiningResourceService<M, I> {
    mutable: Arc<M>,
    immutable: Arc<I>,
    generator: IdentifierGenerator,
    supported: BTreeSet<InteractionModel>,
}

impl<M, I> JoiningResourceService<M, I>
where
    M: MutableDataService,
    I: ImmutableDataService,
{
    /// Join two stores. Every interaction model is accepted.
    pub fn new(mutable: M, immutable: I) -> Self {
        Self::from_shared(Arc::new(mutable), Arc::new(immutable))
    }

    /// Join stores that are also used elsewhere.
    pub fn from_shared(mutable: Arc<M>, immutable: Arc<I>) -> Self {
        tracing::info!("joining resource service ready");
        Self {
            mutable,
            immutable,
            generator: IdentifierGenerator::flat(RESOURCE_PREFIX),
            supported: InteractionModel::ALL.into_iter().collect(),
        }
    }

    /// Restrict the interaction models accepted by writes.
    pub fn with_supported_models(
        mut self,
        models: impl IntoIterator<Item = InteractionModel>,
    ) -> Self {
        self.supported = models.into_iter().collect();
        self
    }

    pub fn mutable_store(&self) -> &M {
        &self.mutable
    }

    pub fn immutable_store(&self) -> &I {
        &self.immutable
    }

    fn check_model(&self, metadata: &Metadata) -> Result<()> {
        let model = metadata.interaction_model();
        if !self.supported.contains(&model) {
            tracing::warn!(identifier = %metadata.identifier(), %model, "unsupported interaction model");
            return Err(TrellisError::UnsupportedInteractionModel {
                identifier: metadata.identifier().to_string(),
                model,
            });
        }
        Ok(())
    }
}

#[async_trait]
impl<M, I> ResourceService for JoiningResourceService<M, I>
where
    M: MutableDataService,
    I: ImmutableDataService,
{
    async fn get(&self, identifier: &Iri) -> Result<Resource> {
        let (mutable, immutable) =
            tokio::join!(self.mutable.get(identifier), self.immutable.get(identifier));

        let resource = merge(mutable?, immutable?);
        tracing::debug!(%identifier, variant = resource.variant().name(), "resolved resource");
        Ok(resource)
    }

    async fn create(&self, metadata: &Metadata, dataset: &Dataset) -> Result<()> {
        self.check_model(metadata)?;
        tracing::debug!(identifier = %metadata.identifier(), quads = dataset.len(), "create");
        Ok(self.mutable.create(metadata, dataset).await?)
    }

    async fn replace(&self, metadata: &Metadata, dataset: &Dataset) -> Result<()> {
        self.check_model(metadata)?;
        tracing::debug!(identifier = %metadata.identifier(), quads = dataset.len(), "replace");
        Ok(self.mutable.replace(metadata, dataset).await?)
    }

    async fn delete(&self, metadata: &Metadata) -> Result<()> {
        tracing::debug!(identifier = %metadata.identifier(), "delete");
        Ok(self.mutable.delete(metadata).await?)
    }

    async fn add(&self, identifier: &Iri, dataset: &Dataset) -> Result<()> {
        tracing::debug!(%identifier, quads = dataset.len(), "append");
        Ok(self.immutable.add(identifier, dataset).await?)
    }

    async fn touch(&self, identifier: &Iri) -> Result<()> {
        Ok(self.mutable.touch(identifier).await?)
    }

    fn supported_interaction_models(&self) -> &BTreeSet<InteractionModel> {
        &self.supported
    }

    fn generate_identifier(&self) -> String {
        self.generator.generate()
    }
}
