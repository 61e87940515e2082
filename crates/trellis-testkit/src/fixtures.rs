//! Test fixtures and helpers.
//!
//! Common setup code for integration tests. Helpers panic on bad input.

use tempfile::TempDir;
use trellis::JoiningResourceService;
use trellis_binary::FileBinaryService;
use trellis_core::{graphs, Dataset, Iri, Quad, Term};
use trellis_store::{MemoryImmutableStore, MemoryMutableStore};

/// Identifier both fixture stores refuse to write.
pub const BAD_IDENTIFIER: &str = "http://bad.com";

const DC_TITLE: &str = "http://purl.org/dc/terms/title";
const PROV_GENERATED_BY: &str = "http://www.w3.org/ns/prov#wasGeneratedBy";
const ACL_MODE: &str = "http://www.w3.org/ns/auth/acl#mode";

/// Parse an IRI.
pub fn iri(value: &str) -> Iri {
    Iri::new(value).unwrap_or_else(|e| panic!("bad fixture IRI {:?}: {}", value, e))
}

/// A literal-valued quad in `graph`.
pub fn quad(graph: &str, subject: &str, predicate: &str, value: &str) -> Quad {
    Quad::new(
        Some(Term::Iri(iri(graph))),
        Term::Iri(iri(subject)),
        iri(predicate),
        Term::literal(value),
    )
}

/// A `dc:title` statement in the user-managed graph.
pub fn user_quad(subject: &str, value: &str) -> Quad {
    quad(graphs::PREFER_USER_MANAGED, subject, DC_TITLE, value)
}

/// A provenance statement in the audit graph.
pub fn audit_quad(subject: &str, value: &str) -> Quad {
    quad(graphs::PREFER_AUDIT, subject, PROV_GENERATED_BY, value)
}

/// An authorization statement in the access-control graph.
pub fn acl_quad(subject: &str, mode: &str) -> Quad {
    quad(graphs::PREFER_ACCESS_CONTROL, subject, ACL_MODE, mode)
}

pub fn dataset(quads: &[Quad]) -> Dataset {
    quads.iter().cloned().collect()
}

/// In-memory joining service.
pub type MemoryResourceService = JoiningResourceService<MemoryMutableStore, MemoryImmutableStore>;

/// A joining service over in-memory stores that reject [`BAD_IDENTIFIER`].
pub struct TestFixture {
    pub service: MemoryResourceService,
    pub bad_identifier: Iri,
}

impl TestFixture {
    pub fn new() -> Self {
        let bad = iri(BAD_IDENTIFIER);
        Self {
            service: JoiningResourceService::new(
                MemoryMutableStore::new().with_reserved([bad.clone()]),
                MemoryImmutableStore::new().with_reserved([bad.clone()]),
            ),
            bad_identifier: bad,
        }
    }
}

impl Default for TestFixture {
    fn default() -> Self {
        Self::new()
    }
}

/// A file binary store rooted in a fresh temporary directory.
///
/// The directory is removed when the fixture is dropped.
pub struct BinaryFixture {
    pub dir: TempDir,
    pub service: FileBinaryService,
}

impl BinaryFixture {
    /// Default 3 x 2 layout.
    pub fn new() -> Self {
        let dir = TempDir::new().unwrap_or_else(|e| panic!("temp dir: {}", e));
        let service = FileBinaryService::new(dir.path())
            .unwrap_or_else(|e| panic!("file binary service: {}", e));
        Self { dir, service }
    }

    pub fn with_layout(hierarchy: usize, length: usize) -> Self {
        let dir = TempDir::new().unwrap_or_else(|e| panic!("temp dir: {}", e));
        let service = FileBinaryService::with_layout(dir.path(), hierarchy, length)
            .unwrap_or_else(|e| panic!("file binary service: {}", e));
        Self { dir, service }
    }

    /// A fresh identifier minted by the store.
    pub fn identifier(&self) -> Iri {
        use trellis_binary::BinaryService;
        iri(&self.service.generate_identifier())
    }
}

impl Default for BinaryFixture {
    fn default() -> Self {
        Self::new()
    }
}
