//! Write descriptors: [`Metadata`] for resources, [`BinaryMetadata`] for
//! binary content.

use serde::{Deserialize, Serialize};

use crate::digest::Digest;
use crate::error::{CoreError, Result};
use crate::iri::Iri;
use crate::model::InteractionModel;
use crate::resource::Resource;

/// Describes a binary body referenced from a resource.
///
/// Created by the caller before a content write, never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BinaryMetadata {
    /// Where the bytes live in the binary store.
    pub identifier: Iri,
    /// Declared content type.
    pub mime_type: Option<String>,
    /// Digests the caller already knows. Stores verify these during the write.
    pub digests: Vec<Digest>,
}

impl BinaryMetadata {
    /// Metadata with no content type and no declared digests.
    pub fn new(identifier: Iri) -> Self {
        Self {
            identifier,
            mime_type: None,
            digests: Vec::new(),
        }
    }

    /// Set the declared content type.
    pub fn mime_type(mut self, mime_type: impl Into<String>) -> Self {
        self.mime_type = Some(mime_type.into());
        self
    }

    /// Declare a digest the stored bytes must match.
    pub fn digest(mut self, digest: Digest) -> Self {
        self.digests.push(digest);
        self
    }
}

/// Describes a resource write.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Metadata {
    identifier: Iri,
    interaction_model: InteractionModel,
    container: Option<Iri>,
    binary: Option<BinaryMetadata>,
}

impl Metadata {
    /// Start building metadata for `identifier`.
    pub fn builder(identifier: Iri) -> MetadataBuilder {
        MetadataBuilder {
            identifier,
            interaction_model: InteractionModel::default(),
            container: None,
            binary: None,
        }
    }

    /// Start from the scalar state of an existing resource.
    ///
    /// Fails for the missing sentinel, which has no identifier to copy.
    pub fn builder_from(resource: &Resource) -> Result<MetadataBuilder> {
        Ok(MetadataBuilder {
            identifier: resource.identifier()?.clone(),
            interaction_model: resource.interaction_model()?,
            container: resource.container()?.cloned(),
            binary: resource.binary_metadata()?.cloned(),
        })
    }

    pub fn identifier(&self) -> &Iri {
        &self.identifier
    }

    pub fn interaction_model(&self) -> InteractionModel {
        self.interaction_model
    }

    pub fn container(&self) -> Option<&Iri> {
        self.container.as_ref()
    }

    pub fn binary(&self) -> Option<&BinaryMetadata> {
        self.binary.as_ref()
    }
}

/// Builder for [`Metadata`].
#[derive(Debug, Clone)]
pub struct MetadataBuilder {
    identifier: Iri,
    interaction_model: InteractionModel,
    container: Option<Iri>,
    binary: Option<BinaryMetadata>,
}

impl MetadataBuilder {
    pub fn interaction_model(mut self, model: InteractionModel) -> Self {
        self.interaction_model = model;
        self
    }

    pub fn container(mut self, container: Iri) -> Self {
        self.container = Some(container);
        self
    }

    pub fn binary(mut self, binary: BinaryMetadata) -> Self {
        self.binary = Some(binary);
        self
    }

    /// Finish the builder.
    ///
    /// A binary descriptor is only permitted on `NonRDFSource` resources.
    pub fn build(self) -> Result<Metadata> {
        if self.binary.is_some() && !self.interaction_model.permits_binary() {
            return Err(CoreError::InvalidArgument(format!(
                "{} may not carry binary content ({})",
                self.identifier, self.interaction_model
            )));
        }

        Ok(Metadata {
            identifier: self.identifier,
            interaction_model: self.interaction_model,
            container: self.container,
            binary: self.binary,
        })
    }
}
