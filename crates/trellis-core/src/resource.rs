//! Resource variants.
//!
//! A [`Resource`] is one of a closed set of shapes:
//!
//! - [`StoredResource`]: read directly from a store.
//! - [`MergedResource`]: a mutable-side resource joined with an optional
//!   immutable-side resource.
//! - [`DraftResource`]: staged for a write, not yet persisted.
//! - `Missing`: the sentinel returned when nothing exists at an identifier.
//!
//! Capabilities a variant cannot answer fail with [`CoreError::Unsupported`].

use std::fmt;

use crate::error::{CoreError, Result};
use crate::iri::Iri;
use crate::metadata::BinaryMetadata;
use crate::model::InteractionModel;
use crate::rdf::Dataset;

/// Discriminant of a [`Resource`], for logging and error messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResourceVariant {
    Stored,
    Merged,
    Draft,
    Missing,
}

impl ResourceVariant {
    pub const fn name(&self) -> &'static str {
        match self {
            ResourceVariant::Stored => "stored",
            ResourceVariant::Merged => "merged",
            ResourceVariant::Draft => "draft",
            ResourceVariant::Missing => "missing",
        }
    }
}

impl fmt::Display for ResourceVariant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A resource as seen by callers of the persistence layer.
#[derive(Debug, Clone, PartialEq)]
pub enum Resource {
    Stored(StoredResource),
    Merged(MergedResource),
    Draft(DraftResource),
    /// Nothing exists at the requested identifier. Not an error.
    Missing,
}

impl Resource {
    pub fn variant(&self) -> ResourceVariant {
        match self {
            Resource::Stored(_) => ResourceVariant::Stored,
            Resource::Merged(_) => ResourceVariant::Merged,
            Resource::Draft(_) => ResourceVariant::Draft,
            Resource::Missing => ResourceVariant::Missing,
        }
    }

    pub fn is_missing(&self) -> bool {
        matches!(self, Resource::Missing)
    }

    pub fn identifier(&self) -> Result<&Iri> {
        match self {
            Resource::Stored(r) => Ok(&r.identifier),
            Resource::Merged(r) => r.identifier(),
            Resource::Draft(r) => Ok(&r.identifier),
            Resource::Missing => Err(unsupported("identifier", ResourceVariant::Missing)),
        }
    }

    pub fn interaction_model(&self) -> Result<InteractionModel> {
        match self {
            Resource::Stored(r) => Ok(r.interaction_model),
            Resource::Merged(r) => r.interaction_model(),
            Resource::Draft(r) => Ok(r.interaction_model),
            Resource::Missing => Err(unsupported("interaction model", ResourceVariant::Missing)),
        }
    }

    /// Last modification time, Unix ms.
    pub fn modified(&self) -> Result<i64> {
        match self {
            Resource::Stored(r) => Ok(r.modified),
            Resource::Merged(r) => r.modified(),
            Resource::Draft(r) => Ok(r.modified),
            Resource::Missing => Err(unsupported("modified", ResourceVariant::Missing)),
        }
    }

    pub fn container(&self) -> Result<Option<&Iri>> {
        match self {
            Resource::Stored(r) => Ok(r.container.as_ref()),
            Resource::Merged(r) => r.container(),
            Resource::Draft(r) => Ok(r.container.as_ref()),
            Resource::Missing => Err(unsupported("container", ResourceVariant::Missing)),
        }
    }

    /// Whether an ACL is attached.
    ///
    /// Drafts have no backing store to answer this and always fail.
    pub fn has_acl(&self) -> Result<bool> {
        match self {
            Resource::Stored(r) => Ok(r.has_acl),
            Resource::Merged(r) => r.has_acl(),
            Resource::Draft(_) => Err(unsupported("ACL lookup", ResourceVariant::Draft)),
            Resource::Missing => Err(unsupported("ACL lookup", ResourceVariant::Missing)),
        }
    }

    pub fn binary_metadata(&self) -> Result<Option<&BinaryMetadata>> {
        match self {
            Resource::Stored(r) => Ok(r.binary.as_ref()),
            Resource::Merged(r) => r.binary_metadata(),
            Resource::Draft(_) => Ok(None),
            Resource::Missing => Err(unsupported("binary metadata", ResourceVariant::Missing)),
        }
    }

    /// All quads of the resource. Empty for the missing sentinel.
    pub fn quads(&self) -> Dataset {
        match self {
            Resource::Stored(r) => r.quads.clone(),
            Resource::Merged(r) => r.quads(),
            Resource::Draft(r) => r.quads.clone(),
            Resource::Missing => Dataset::new(),
        }
    }
}

/// Join a mutable-side and an immutable-side lookup into one view.
///
/// | mutable | immutable | result                         |
/// |---------|-----------|--------------------------------|
/// | missing | missing   | `Missing`                      |
/// | present | missing   | `Merged` (mutable only)        |
/// | missing | present   | `Merged` (immutable only)      |
/// | present | present   | `Merged` (both)                |
pub fn merge(mutable: Resource, immutable: Resource) -> Resource {
    match (mutable.is_missing(), immutable.is_missing()) {
        (true, true) => Resource::Missing,
        (false, true) => Resource::Merged(MergedResource::new(mutable, None)),
        (true, false) => Resource::Merged(MergedResource::immutable_only(immutable)),
        (false, false) => Resource::Merged(MergedResource::new(mutable, Some(immutable))),
    }
}

fn unsupported(operation: &'static str, variant: ResourceVariant) -> CoreError {
    CoreError::Unsupported {
        operation,
        variant: variant.name(),
    }
}

/// A resource whose fields were all read from a store.
#[derive(Debug, Clone, PartialEq)]
pub struct StoredResource {
    pub identifier: Iri,
    pub interaction_model: InteractionModel,
    /// Unix ms.
    pub modified: i64,
    pub container: Option<Iri>,
    pub has_acl: bool,
    pub binary: Option<BinaryMetadata>,
    pub quads: Dataset,
}

/// A mutable-side resource joined with an optional immutable-side resource.
///
/// Scalar fields come only from the mutable side; the immutable side only
/// contributes quads. When the mutable side is absent the view uses
/// `RDFSource` as its interaction model, has no container, no ACL and no
/// binary, and takes its timestamp from the immutable side.
#[derive(Debug, Clone, PartialEq)]
pub struct MergedResource {
    mutable: Option<Box<Resource>>,
    immutable: Option<Box<Resource>>,
}

impl MergedResource {
    /// Join a mutable-side resource with an optional immutable side.
    ///
    /// A missing immutable side is treated as absent, so the result behaves
    /// exactly like `mutable` alone.
    pub fn new(mutable: Resource, immutable: Option<Resource>) -> Self {
        Self {
            mutable: present(mutable),
            immutable: immutable.and_then(present),
        }
    }

    /// A view over immutable data for which no current record exists.
    pub fn immutable_only(immutable: Resource) -> Self {
        Self {
            mutable: None,
            immutable: present(immutable),
        }
    }

    pub fn mutable_side(&self) -> Option<&Resource> {
        self.mutable.as_deref()
    }

    pub fn immutable_side(&self) -> Option<&Resource> {
        self.immutable.as_deref()
    }

    fn identifier(&self) -> Result<&Iri> {
        match (&self.mutable, &self.immutable) {
            (Some(m), _) => m.identifier(),
            (None, Some(i)) => i.identifier(),
            (None, None) => Err(unsupported("identifier", ResourceVariant::Missing)),
        }
    }

    fn interaction_model(&self) -> Result<InteractionModel> {
        match (&self.mutable, &self.immutable) {
            (Some(m), _) => m.interaction_model(),
            (None, Some(_)) => Ok(InteractionModel::RdfSource),
            (None, None) => Err(unsupported("interaction model", ResourceVariant::Missing)),
        }
    }

    fn modified(&self) -> Result<i64> {
        match (&self.mutable, &self.immutable) {
            (Some(m), _) => m.modified(),
            (None, Some(i)) => i.modified(),
            (None, None) => Err(unsupported("modified", ResourceVariant::Missing)),
        }
    }

    fn container(&self) -> Result<Option<&Iri>> {
        match (&self.mutable, &self.immutable) {
            (Some(m), _) => m.container(),
            (None, Some(_)) => Ok(None),
            (None, None) => Err(unsupported("container", ResourceVariant::Missing)),
        }
    }

    fn has_acl(&self) -> Result<bool> {
        match (&self.mutable, &self.immutable) {
            (Some(m), _) => m.has_acl(),
            (None, Some(_)) => Ok(false),
            (None, None) => Err(unsupported("ACL lookup", ResourceVariant::Missing)),
        }
    }

    fn binary_metadata(&self) -> Result<Option<&BinaryMetadata>> {
        match (&self.mutable, &self.immutable) {
            (Some(m), _) => m.binary_metadata(),
            (None, Some(_)) => Ok(None),
            (None, None) => Err(unsupported("binary metadata", ResourceVariant::Missing)),
        }
    }

    fn quads(&self) -> Dataset {
        let mut quads = self.mutable.as_ref().map(|m| m.quads()).unwrap_or_default();
        if let Some(immutable) = &self.immutable {
            quads.extend_from(&immutable.quads());
        }
        quads
    }
}

fn present(resource: Resource) -> Option<Box<Resource>> {
    (!resource.is_missing()).then(|| Box::new(resource))
}

/// A resource staged for a write.
///
/// Its timestamp is fixed when the draft is built.
#[derive(Debug, Clone, PartialEq)]
pub struct DraftResource {
    identifier: Iri,
    interaction_model: InteractionModel,
    container: Option<Iri>,
    modified: i64,
    quads: Dataset,
}

impl DraftResource {
    pub fn new(
        identifier: Iri,
        interaction_model: InteractionModel,
        container: Option<Iri>,
        quads: Dataset,
    ) -> Self {
        Self {
            identifier,
            interaction_model,
            container,
            modified: now_millis(),
            quads,
        }
    }

    pub fn identifier(&self) -> &Iri {
        &self.identifier
    }

    pub fn quads(&self) -> &Dataset {
        &self.quads
    }
}

/// Current time in Unix milliseconds.
pub fn now_millis() -> i64 {
    use std::time::{SystemTime, UNIX_EPOCH};
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as i64)
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rdf::{graphs, Quad, Term};

    fn iri(s: &str) -> Iri {
        Iri::new(s).unwrap()
    }

    fn quad(s: &str, o: &str) -> Quad {
        Quad::new(
            Some(Term::Iri(iri(graphs::PREFER_USER_MANAGED))),
            Term::Iri(iri(s)),
            iri("http://purl.org/dc/terms/title"),
            Term::literal(o),
        )
    }

    fn stored(id: &str, model: InteractionModel, modified: i64, quads: &[Quad]) -> Resource {
        Resource::Stored(StoredResource {
            identifier: iri(id),
            interaction_model: model,
            modified,
            container: None,
            has_acl: false,
            binary: None,
            quads: quads.iter().cloned().collect(),
        })
    }

    #[test]
    fn test_merged_takes_scalars_from_mutable() {
        let mutable = Resource::Stored(StoredResource {
            identifier: iri("http://example.com/2"),
            interaction_model: InteractionModel::BasicContainer,
            modified: 1000,
            container: Some(iri("http://example.com/")),
            has_acl: true,
            binary: None,
            quads: [quad("http://example.com/2", "m")].into_iter().collect(),
        });
        let immutable = stored(
            "http://example.com/2",
            InteractionModel::NonRdfSource,
            9999,
            &[quad("http://example.com/2", "i")],
        );

        let merged = merge(mutable, immutable);
        assert_eq!(merged.variant(), ResourceVariant::Merged);
        assert_eq!(merged.interaction_model().unwrap(), InteractionModel::BasicContainer);
        assert_eq!(merged.modified().unwrap(), 1000);
        assert!(merged.has_acl().unwrap());
        assert_eq!(
            merged.container().unwrap().map(Iri::as_str),
            Some("http://example.com/")
        );

        let quads = merged.quads();
        assert_eq!(quads.len(), 2);
        assert!(quads.contains(&quad("http://example.com/2", "m")));
        assert!(quads.contains(&quad("http://example.com/2", "i")));
    }

    #[test]
    fn test_merged_without_immutable_matches_mutable() {
        let q = quad("http://example.com/1", "only");
        let mutable = stored("http://example.com/1", InteractionModel::RdfSource, 77, &[q.clone()]);

        let merged = Resource::Merged(MergedResource::new(mutable.clone(), None));
        assert_eq!(merged.identifier().unwrap(), mutable.identifier().unwrap());
        assert_eq!(merged.interaction_model().unwrap(), mutable.interaction_model().unwrap());
        assert_eq!(merged.modified().unwrap(), mutable.modified().unwrap());
        assert_eq!(merged.has_acl().unwrap(), mutable.has_acl().unwrap());
        assert_eq!(merged.container().unwrap(), mutable.container().unwrap());
        assert_eq!(merged.quads(), mutable.quads());

        let with_missing = Resource::Merged(MergedResource::new(mutable.clone(), Some(Resource::Missing)));
        assert_eq!(with_missing, merged);
    }

    #[test]
    fn test_merge_collapses_duplicate_quads() {
        let q = quad("http://example.com/2", "same");
        let merged = merge(
            stored("http://example.com/2", InteractionModel::RdfSource, 1, &[q.clone()]),
            stored("http://example.com/2", InteractionModel::RdfSource, 2, &[q.clone()]),
        );
        assert_eq!(merged.quads().len(), 1);
    }

    #[test]
    fn test_merge_immutable_only() {
        let q = quad("http://example.com/3", "history");
        let merged = merge(
            Resource::Missing,
            stored("http://example.com/3", InteractionModel::BasicContainer, 5, &[q.clone()]),
        );

        assert_eq!(merged.identifier().unwrap().as_str(), "http://example.com/3");
        assert_eq!(merged.interaction_model().unwrap(), InteractionModel::RdfSource);
        assert_eq!(merged.modified().unwrap(), 5);
        assert!(!merged.has_acl().unwrap());
        assert!(merged.container().unwrap().is_none());
        assert!(merged.quads().contains(&q));
    }

    #[test]
    fn test_merge_both_missing() {
        assert!(merge(Resource::Missing, Resource::Missing).is_missing());
    }

    #[test]
    fn test_draft_resource() {
        let before = now_millis();
        let q = quad("http://example.com/2", "draft");
        let draft = Resource::Draft(DraftResource::new(
            iri("trellis:identifier"),
            InteractionModel::Container,
            None,
            [q.clone()].into_iter().collect(),
        ));

        assert_eq!(draft.identifier().unwrap().as_str(), "trellis:identifier");
        assert_eq!(draft.interaction_model().unwrap(), InteractionModel::Container);
        let modified = draft.modified().unwrap();
        assert!(modified >= before);
        assert!(modified <= now_millis());
        assert_eq!(draft.modified().unwrap(), modified);
        assert!(draft.quads().contains(&q));
        assert!(draft.container().unwrap().is_none());
        assert!(matches!(
            draft.has_acl(),
            Err(CoreError::Unsupported { variant: "draft", .. })
        ));
    }

    #[test]
    fn test_missing_sentinel() {
        let missing = Resource::Missing;
        assert!(missing.is_missing());
        assert!(missing.quads().is_empty());
        assert!(missing.identifier().is_err());
        assert!(missing.has_acl().is_err());
    }
}
