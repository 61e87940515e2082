//! IRI identifiers.
//!
//! Every resource and binary is addressed by an [`Iri`]. The type only checks
//! the shape the persistence layer relies on (a scheme followed by a
//! scheme-specific part); full RFC 3987 validation is the codec layer's job.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::{CoreError, Result};

/// An IRI-shaped identifier.
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Iri(String);

impl Iri {
    /// Parse and validate an IRI.
    pub fn new(value: impl Into<String>) -> Result<Self> {
        let value = value.into();
        validate(&value)?;
        Ok(Self(value))
    }

    /// Wrap a string already known to be a valid IRI.
    pub(crate) fn from_trusted(value: String) -> Self {
        debug_assert!(validate(&value).is_ok());
        Self(value)
    }

    /// The full IRI string.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The scheme, without the trailing colon.
    pub fn scheme(&self) -> &str {
        // Validated on construction: a colon is always present.
        self.0.split_once(':').map(|(scheme, _)| scheme).unwrap_or_default()
    }

    /// Everything after the first colon.
    pub fn scheme_specific_part(&self) -> &str {
        self.0.split_once(':').map(|(_, rest)| rest).unwrap_or_default()
    }

    /// Whether the scheme matches, ignoring ASCII case.
    pub fn has_scheme(&self, scheme: &str) -> bool {
        self.scheme().eq_ignore_ascii_case(scheme)
    }

    /// Consume into the inner string.
    pub fn into_string(self) -> String {
        self.0
    }
}

fn validate(value: &str) -> Result<()> {
    let invalid = |reason| CoreError::InvalidIri {
        value: value.to_string(),
        reason,
    };

    let (scheme, _) = value.split_once(':').ok_or_else(|| invalid("missing scheme"))?;

    let mut chars = scheme.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() => {}
        _ => return Err(invalid("scheme must start with a letter")),
    }
    if !chars.all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.')) {
        return Err(invalid("illegal character in scheme"));
    }
    if value.chars().any(char::is_whitespace) {
        return Err(invalid("whitespace is not allowed"));
    }
    Ok(())
}

impl fmt::Debug for Iri {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<{}>", self.0)
    }
}

impl fmt::Display for Iri {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for Iri {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl FromStr for Iri {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self> {
        Self::new(s)
    }
}

impl TryFrom<String> for Iri {
    type Error = CoreError;

    fn try_from(value: String) -> Result<Self> {
        Self::new(value)
    }
}

impl TryFrom<&str> for Iri {
    type Error = CoreError;

    fn try_from(value: &str) -> Result<Self> {
        Self::new(value)
    }
}

impl From<Iri> for String {
    fn from(iri: Iri) -> Self {
        iri.0
    }
}

/// Strip every leading repetition of `prefix` from `value`.
///
/// Bounded by the input length, so adversarial input cannot loop or recurse
/// without end. An empty prefix returns the input untouched.
pub fn trim_leading<'a>(value: &'a str, prefix: &str) -> &'a str {
    if prefix.is_empty() {
        return value;
    }

    let mut rest = value;
    for _ in 0..value.len() {
        match rest.strip_prefix(prefix) {
            Some(stripped) => rest = stripped,
            None => break,
        }
    }
    rest
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_valid_iris() {
        let iri = Iri::new("http://example.com/1").unwrap();
        assert_eq!(iri.scheme(), "http");
        assert_eq!(iri.scheme_specific_part(), "//example.com/1");

        let iri = Iri::new("trellis:data/resource").unwrap();
        assert_eq!(iri.scheme(), "trellis");
        assert_eq!(iri.scheme_specific_part(), "data/resource");

        let iri = Iri::new("file:///ab/cd").unwrap();
        assert!(iri.has_scheme("FILE"));
    }

    #[test]
    fn test_reject_invalid_iris() {
        assert!(Iri::new("").is_err());
        assert!(Iri::new("no-scheme").is_err());
        assert!(Iri::new(":empty-scheme").is_err());
        assert!(Iri::new("1http://example.com").is_err());
        assert!(Iri::new("ht tp://example.com").is_err());
        assert!(Iri::new("http://example.com/a b").is_err());
    }

    #[test]
    fn test_serde_validates() {
        let iri: Iri = serde_json::from_str("\"http://example.com/x\"").unwrap();
        assert_eq!(iri.as_str(), "http://example.com/x");
        assert!(serde_json::from_str::<Iri>("\"not an iri\"").is_err());
    }

    #[test]
    fn test_trim_leading() {
        assert_eq!(trim_leading("///ab/cd", "/"), "ab/cd");
        assert_eq!(trim_leading("ab/cd", "/"), "ab/cd");
        assert_eq!(trim_leading("////", "/"), "");
        assert_eq!(trim_leading("ababx", "ab"), "x");
        assert_eq!(trim_leading("abc", ""), "abc");
    }

    #[test]
    fn test_trim_leading_long_input() {
        let input = "/".repeat(100_000) + "leaf";
        assert_eq!(trim_leading(&input, "/"), "leaf");
    }

    proptest::proptest! {
        #[test]
        fn test_trim_leading_strips_exactly_the_repeats(
            reps in 0usize..50,
            rest in "[a-z][a-z/]{0,10}",
        ) {
            let input = "/".repeat(reps) + &rest;
            proptest::prop_assert_eq!(trim_leading(&input, "/"), rest.as_str());
        }
    }
}
