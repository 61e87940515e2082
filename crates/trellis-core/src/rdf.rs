//! Minimal RDF data model.
//!
//! Parsing and serialization belong to the codec layer; the persistence core
//! only needs terms it can compare, order, and store.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

use crate::iri::Iri;

/// Well-known graph names used to partition a resource's quads.
pub mod graphs {
    /// User-managed statements.
    pub const PREFER_USER_MANAGED: &str = "http://www.trellisldp.org/ns/trellis#PreferUserManaged";
    /// Server-managed statements.
    pub const PREFER_SERVER_MANAGED: &str =
        "http://www.trellisldp.org/ns/trellis#PreferServerManaged";
    /// Access-control statements. A resource has an ACL iff this graph is non-empty.
    pub const PREFER_ACCESS_CONTROL: &str =
        "http://www.trellisldp.org/ns/trellis#PreferAccessControl";
    /// Audit statements, normally appended to the immutable store.
    pub const PREFER_AUDIT: &str = "http://www.trellisldp.org/ns/trellis#PreferAudit";
}

/// An RDF term.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Term {
    Iri(Iri),
    BlankNode(String),
    Literal {
        value: String,
        datatype: Option<Iri>,
        language: Option<String>,
    },
}

impl Term {
    /// A plain string literal.
    pub fn literal(value: impl Into<String>) -> Self {
        Term::Literal {
            value: value.into(),
            datatype: None,
            language: None,
        }
    }

    /// A typed literal.
    pub fn typed_literal(value: impl Into<String>, datatype: Iri) -> Self {
        Term::Literal {
            value: value.into(),
            datatype: Some(datatype),
            language: None,
        }
    }

    /// The IRI, if this term is one.
    pub fn as_iri(&self) -> Option<&Iri> {
        match self {
            Term::Iri(iri) => Some(iri),
            _ => None,
        }
    }
}

impl From<Iri> for Term {
    fn from(iri: Iri) -> Self {
        Term::Iri(iri)
    }
}

impl fmt::Display for Term {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Term::Iri(iri) => write!(f, "<{}>", iri),
            Term::BlankNode(label) => write!(f, "_:{}", label),
            Term::Literal {
                value,
                datatype,
                language,
            } => {
                write!(f, "{:?}", value)?;
                if let Some(lang) = language {
                    write!(f, "@{}", lang)
                } else if let Some(dt) = datatype {
                    write!(f, "^^<{}>", dt)
                } else {
                    Ok(())
                }
            }
        }
    }
}

/// A statement with an optional graph name.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Quad {
    pub graph: Option<Term>,
    pub subject: Term,
    pub predicate: Iri,
    pub object: Term,
}

impl Quad {
    /// Create a quad.
    pub fn new(graph: Option<Term>, subject: Term, predicate: Iri, object: Term) -> Self {
        Self {
            graph,
            subject,
            predicate,
            object,
        }
    }

    /// Whether this quad sits in the named graph.
    pub fn in_graph(&self, name: &str) -> bool {
        matches!(&self.graph, Some(Term::Iri(g)) if g.as_str() == name)
    }
}

impl fmt::Display for Quad {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} <{}> {}", self.subject, self.predicate, self.object)?;
        if let Some(graph) = &self.graph {
            write!(f, " {}", graph)?;
        }
        write!(f, " .")
    }
}

/// A set of quads. Inserting a duplicate is a no-op.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dataset {
    quads: BTreeSet<Quad>,
}

impl Dataset {
    /// An empty dataset.
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a quad. Returns `false` if it was already present.
    pub fn insert(&mut self, quad: Quad) -> bool {
        self.quads.insert(quad)
    }

    /// Remove a quad. Returns `true` if it was present.
    pub fn remove(&mut self, quad: &Quad) -> bool {
        self.quads.remove(quad)
    }

    pub fn contains(&self, quad: &Quad) -> bool {
        self.quads.contains(quad)
    }

    pub fn len(&self) -> usize {
        self.quads.len()
    }

    pub fn is_empty(&self) -> bool {
        self.quads.is_empty()
    }

    /// Iterate in a stable order.
    pub fn iter(&self) -> impl Iterator<Item = &Quad> {
        self.quads.iter()
    }

    /// Add every quad of `other`.
    pub fn extend_from(&mut self, other: &Dataset) {
        self.quads.extend(other.quads.iter().cloned());
    }

    /// Set union of two datasets.
    pub fn union(&self, other: &Dataset) -> Dataset {
        Dataset {
            quads: self.quads.union(&other.quads).cloned().collect(),
        }
    }

    /// Quads in the named graph.
    pub fn graph(&self, name: &str) -> Dataset {
        self.quads.iter().filter(|q| q.in_graph(name)).cloned().collect()
    }

    /// Whether any quad sits in the named graph.
    pub fn has_graph(&self, name: &str) -> bool {
        self.quads.iter().any(|q| q.in_graph(name))
    }
}

impl FromIterator<Quad> for Dataset {
    fn from_iter<T: IntoIterator<Item = Quad>>(iter: T) -> Self {
        Self {
            quads: iter.into_iter().collect(),
        }
    }
}

impl Extend<Quad> for Dataset {
    fn extend<T: IntoIterator<Item = Quad>>(&mut self, iter: T) {
        self.quads.extend(iter);
    }
}

impl IntoIterator for Dataset {
    type Item = Quad;
    type IntoIter = std::collections::btree_set::IntoIter<Quad>;

    fn into_iter(self) -> Self::IntoIter {
        self.quads.into_iter()
    }
}

impl<'a> IntoIterator for &'a Dataset {
    type Item = &'a Quad;
    type IntoIter = std::collections::btree_set::Iter<'a, Quad>;

    fn into_iter(self) -> Self::IntoIter {
        self.quads.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn iri(s: &str) -> Iri {
        Iri::new(s).unwrap()
    }

    fn quad(graph: &str, s: &str, o: &str) -> Quad {
        Quad::new(
            Some(Term::Iri(iri(graph))),
            Term::Iri(iri(s)),
            iri("http://purl.org/dc/terms/title"),
            Term::literal(o),
        )
    }

    #[test]
    fn test_dataset_collapses_duplicates() {
        let mut ds = Dataset::new();
        assert!(ds.insert(quad(graphs::PREFER_USER_MANAGED, "http://example.com/1", "a")));
        assert!(!ds.insert(quad(graphs::PREFER_USER_MANAGED, "http://example.com/1", "a")));
        assert_eq!(ds.len(), 1);
    }

    #[test]
    fn test_union_is_set_union() {
        let a: Dataset = vec![
            quad(graphs::PREFER_USER_MANAGED, "http://example.com/1", "a"),
            quad(graphs::PREFER_USER_MANAGED, "http://example.com/1", "b"),
        ]
        .into_iter()
        .collect();
        let b: Dataset = vec![
            quad(graphs::PREFER_USER_MANAGED, "http://example.com/1", "b"),
            quad(graphs::PREFER_AUDIT, "http://example.com/1", "c"),
        ]
        .into_iter()
        .collect();

        let u = a.union(&b);
        assert_eq!(u.len(), 3);
        assert!(a.iter().all(|q| u.contains(q)));
        assert!(b.iter().all(|q| u.contains(q)));
    }

    #[test]
    fn test_graph_filter() {
        let ds: Dataset = vec![
            quad(graphs::PREFER_USER_MANAGED, "http://example.com/1", "a"),
            quad(graphs::PREFER_ACCESS_CONTROL, "http://example.com/1#auth", "b"),
        ]
        .into_iter()
        .collect();

        assert!(ds.has_graph(graphs::PREFER_ACCESS_CONTROL));
        assert!(!ds.has_graph(graphs::PREFER_AUDIT));
        assert_eq!(ds.graph(graphs::PREFER_USER_MANAGED).len(), 1);
    }

    #[test]
    fn test_quad_display() {
        let q = quad(graphs::PREFER_USER_MANAGED, "http://example.com/1", "a");
        assert_eq!(
            q.to_string(),
            "<http://example.com/1> <http://purl.org/dc/terms/title> \"a\" \
             <http://www.trellisldp.org/ns/trellis#PreferUserManaged> ."
        );
    }
}
