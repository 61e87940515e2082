//! Proptest generators for property-based testing.

use proptest::prelude::*;

use trellis_core::{graphs, Dataset, Iri, Quad, TOKEN_LENGTH};

use crate::fixtures::{iri, quad};

/// A lowercase hex token of at least 10 characters.
pub fn token() -> impl Strategy<Value = String> {
    "[0-9a-f]{10,32}".prop_map(String::from)
}

/// A valid shard layout: `(hierarchy, length)` with `hierarchy * length`
/// fitting inside a token.
pub fn layout() -> impl Strategy<Value = (usize, usize)> {
    (0usize..=8, 1usize..=4).prop_filter("shard prefix must fit in a token", |(h, l)| {
        h * l <= TOKEN_LENGTH
    })
}

/// An `http://example.com/...` subject.
pub fn subject() -> impl Strategy<Value = Iri> {
    "[a-z]{1,8}(/[a-z0-9]{1,8}){0,2}".prop_map(|path| iri(&format!("http://example.com/{}", path)))
}

/// One of the well-known graph names.
pub fn graph() -> impl Strategy<Value = &'static str> {
    prop_oneof![
        Just(graphs::PREFER_USER_MANAGED),
        Just(graphs::PREFER_SERVER_MANAGED),
        Just(graphs::PREFER_AUDIT),
    ]
}

/// A literal-valued quad about `subject`.
pub fn quad_about(subject: Iri) -> impl Strategy<Value = Quad> {
    (graph(), "[a-z]{1,6}", "[ -~]{0,12}").prop_map(move |(g, predicate, value)| {
        quad(
            g,
            subject.as_str(),
            &format!("http://example.com/ns#{}", predicate),
            &value,
        )
    })
}

/// A dataset of up to `max` quads about `subject`. May contain fewer if
/// generated quads collide.
pub fn dataset_about(subject: Iri, max: usize) -> impl Strategy<Value = Dataset> {
    prop::collection::vec(quad_about(subject), 0..=max)
        .prop_map(|quads| quads.into_iter().collect())
}

/// Binary content of up to `max_len` bytes.
pub fn content(max_len: usize) -> impl Strategy<Value = Vec<u8>> {
    prop::collection::vec(any::<u8>(), 0..=max_len)
}

#[cfg(test)]
mod tests {
    use super::*;
    use trellis_core::{IdentifierGenerator, Term};

    proptest! {
        #[test]
        fn test_layout_always_builds_a_generator((h, l) in layout()) {
            prop_assert!(IdentifierGenerator::new("file:///", h, l).is_ok());
        }

        #[test]
        fn test_quads_are_about_subject(
            (s, ds) in subject().prop_flat_map(|s| (Just(s.clone()), dataset_about(s, 4)))
        ) {
            prop_assert!(ds.len() <= 4);
            prop_assert!(ds.iter().all(|q| q.subject == Term::Iri(s.clone())));
        }

        #[test]
        fn test_tokens_are_hex(t in token()) {
            prop_assert!(t.len() >= 10 && t.len() <= TOKEN_LENGTH);
            prop_assert!(t.chars().all(|c| c.is_ascii_hexdigit()));
        }
    }
}
