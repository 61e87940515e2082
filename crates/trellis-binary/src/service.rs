//! The binary storage contract.

use std::collections::BTreeSet;

use async_trait::async_trait;
use tokio::io::AsyncRead;
use trellis_core::{BinaryMetadata, Digest, DigestAlgorithm, Iri};

use crate::digest_reader::DigestReader;
use crate::error::{BinaryError, Result};

/// A boxed byte stream, as consumed by writes and produced by reads.
pub type BinaryReader = Box<dyn AsyncRead + Send + Unpin>;

/// A lazy handle to stored content.
///
/// Obtaining a handle does no I/O; each accessor opens the underlying bytes
/// when called, so a handle for absent content only fails when read.
#[async_trait]
pub trait Binary: Send + Sync {
    /// The identifier this handle points at.
    fn identifier(&self) -> &Iri;

    /// The whole content.
    async fn content(&self) -> Result<BinaryReader>;

    /// Bytes `from..=to`. A range running past the end is truncated.
    async fn content_range(&self, from: u64, to: u64) -> Result<BinaryReader>;

    /// Content length in bytes.
    async fn size(&self) -> Result<u64>;
}

/// Stores and retrieves binary content by identifier.
#[async_trait]
pub trait BinaryService: Send + Sync {
    type Handle: Binary;

    /// A lazy handle to the content at `identifier`.
    async fn get(&self, identifier: &Iri) -> Result<Self::Handle>;

    /// Consume `stream` fully and store it under `metadata.identifier`.
    ///
    /// Existing content is replaced atomically: readers see either the old
    /// bytes or the new ones. Digests declared in `metadata` are verified
    /// against the stream; on mismatch nothing is replaced.
    async fn set_content(&self, metadata: &BinaryMetadata, stream: BinaryReader) -> Result<()>;

    /// Like [`set_content`](Self::set_content), also returning the digest of
    /// the stored bytes computed in the same pass as the write.
    async fn set_content_with_digest(
        &self,
        metadata: &BinaryMetadata,
        stream: BinaryReader,
        algorithm: DigestAlgorithm,
    ) -> Result<Digest> {
        if !self.supported_algorithms().contains(&algorithm) {
            return Err(BinaryError::UnsupportedAlgorithm(algorithm));
        }

        let (reader, handle) = DigestReader::new(stream, &[algorithm]);
        self.set_content(metadata, Box::new(reader)).await?;

        handle
            .finish()?
            .pop()
            .ok_or(BinaryError::UnsupportedAlgorithm(algorithm))
    }

    /// Delete the content at `identifier`. Purging absent content succeeds.
    async fn purge_content(&self, identifier: &Iri) -> Result<()>;

    /// Digest the stored content. Fails with `NotFound` when absent.
    async fn calculate_digest(&self, identifier: &Iri, algorithm: DigestAlgorithm)
        -> Result<Digest>;

    /// Algorithms this store can compute.
    fn supported_algorithms(&self) -> BTreeSet<DigestAlgorithm>;

    /// Mint a fresh identifier for new content.
    fn generate_identifier(&self) -> String;
}
