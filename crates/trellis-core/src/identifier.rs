//! Identifier minting.
//!
//! Identifiers are `prefix + shard segments + "/" + token`, where the token is
//! 32 random hex characters and the shard segments are the first
//! `hierarchy * length` characters of that token split into `hierarchy`
//! pieces. The leaf keeps the whole token, so the shard path can always be
//! re-derived from the identifier alone.
//!
//! ```text
//! file:///ab/12/cd/ab12cd34ef...   (hierarchy = 3, length = 2)
//! trellis:data/ab12cd34ef...       (hierarchy = 0)
//! ```

use crate::error::{CoreError, Result};

/// Characters in a generated token (128 random bits, hex-encoded).
pub const TOKEN_LENGTH: usize = 32;

/// Mints unique identifiers under a prefix with an optional shard hierarchy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IdentifierGenerator {
    prefix: String,
    hierarchy: usize,
    length: usize,
}

impl IdentifierGenerator {
    /// A flat generator: `prefix + token`.
    pub fn flat(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            hierarchy: 0,
            length: 0,
        }
    }

    /// A sharded generator.
    ///
    /// Fails if the shard prefix would not fit inside a token, or if
    /// `length` is zero while `hierarchy` is not.
    pub fn new(prefix: impl Into<String>, hierarchy: usize, length: usize) -> Result<Self> {
        if hierarchy > 0 && length == 0 {
            return Err(CoreError::InvalidArgument(
                "shard length must be positive when hierarchy is non-zero".into(),
            ));
        }
        let shard_chars = hierarchy.checked_mul(length).unwrap_or(usize::MAX);
        if shard_chars > TOKEN_LENGTH {
            return Err(CoreError::InvalidArgument(format!(
                "hierarchy {} x length {} exceeds token length {}",
                hierarchy, length, TOKEN_LENGTH
            )));
        }

        Ok(Self {
            prefix: prefix.into(),
            hierarchy,
            length,
        })
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    pub fn hierarchy(&self) -> usize {
        self.hierarchy
    }

    pub fn length(&self) -> usize {
        self.length
    }

    /// Mint a new identifier.
    pub fn generate(&self) -> String {
        self.with_token(&random_token())
    }

    /// Lay out a given token under this generator's prefix and hierarchy.
    ///
    /// Tokens shorter than the shard prefix get as many whole segments as fit.
    pub fn with_token(&self, token: &str) -> String {
        let mut id = self.prefix.clone();
        let chars: Vec<char> = token.chars().collect();
        for segment in chars.chunks(self.length.max(1)).take(self.hierarchy) {
            if segment.len() < self.length {
                break;
            }
            id.extend(segment.iter());
            id.push('/');
        }
        id.push_str(token);
        id
    }
}

/// 128 random bits as lowercase hex.
pub fn random_token() -> String {
    hex::encode(rand::random::<[u8; 16]>())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sharded_layout() {
        let gen = IdentifierGenerator::new("file:///", 3, 2).unwrap();
        assert_eq!(gen.with_token("ab12cd34ef"), "file:///ab/12/cd/ab12cd34ef");
    }

    #[test]
    fn test_flat_layout() {
        let gen = IdentifierGenerator::flat("trellis:data/");
        assert_eq!(gen.with_token("ab12cd34ef"), "trellis:data/ab12cd34ef");
    }

    #[test]
    fn test_short_token_takes_whole_segments() {
        let gen = IdentifierGenerator::new("file:///", 3, 2).unwrap();
        assert_eq!(gen.with_token("abc"), "file:///ab/abc");
    }

    #[test]
    fn test_generated_shape() {
        let gen = IdentifierGenerator::new("file:///", 3, 2).unwrap();
        let id = gen.generate();
        let rest = id.strip_prefix("file:///").unwrap();
        let parts: Vec<&str> = rest.split('/').collect();

        assert_eq!(parts.len(), 4);
        assert!(parts[..3].iter().all(|p| p.len() == 2));
        assert_eq!(parts[3].len(), TOKEN_LENGTH);
        assert_eq!(parts[..3].concat(), &parts[3][..6]);
    }

    #[test]
    fn test_generated_unique() {
        let gen = IdentifierGenerator::flat("trellis:data/");
        assert_ne!(gen.generate(), gen.generate());
    }

    #[test]
    fn test_invalid_hierarchy() {
        assert!(IdentifierGenerator::new("file:///", 17, 2).is_err());
        assert!(IdentifierGenerator::new("file:///", 2, 0).is_err());
        assert!(IdentifierGenerator::new("file:///", usize::MAX, 2).is_err());
        assert!(IdentifierGenerator::new("file:///", 0, 0).is_ok());
        assert!(IdentifierGenerator::new("file:///", 16, 2).is_ok());
    }

    proptest::proptest! {
        #[test]
        fn test_shards_are_token_prefix(
            hierarchy in 0usize..=8,
            length in 1usize..=4,
            token in "[0-9a-f]{32}",
        ) {
            let gen = IdentifierGenerator::new("file:///", hierarchy, length).unwrap();
            let id = gen.with_token(&token);
            let parts: Vec<&str> = id["file:///".len()..].split('/').collect();

            proptest::prop_assert_eq!(parts.len(), hierarchy + 1);
            proptest::prop_assert_eq!(parts[hierarchy], token.as_str());
            proptest::prop_assert_eq!(parts[..hierarchy].concat(), &token[..hierarchy * length]);
        }
    }
}
