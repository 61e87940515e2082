//! In-memory binary store.

use std::collections::{BTreeSet, HashMap};
use std::io::Cursor;
use std::sync::{Arc, RwLock};

use async_trait::async_trait;
use bytes::Bytes;
use tokio::io::AsyncReadExt;
use trellis_core::{BinaryMetadata, Digest, DigestAlgorithm, IdentifierGenerator, Iri};

use crate::digest_reader::DeclaredDigests;
use crate::error::{BinaryError, Result};
use crate::service::{Binary, BinaryReader, BinaryService};

type Contents = Arc<RwLock<HashMap<Iri, Bytes>>>;

fn lookup(contents: &Contents, identifier: &Iri) -> Result<Bytes> {
    contents
        .read()
        .map_err(|e| BinaryError::Poisoned(e.to_string()))?
        .get(identifier)
        .cloned()
        .ok_or_else(|| BinaryError::NotFound(identifier.to_string()))
}

/// [`BinaryService`] holding content in memory. Accepts any identifier.
pub struct MemoryBinaryService {
    contents: Contents,
    generator: IdentifierGenerator,
}

impl MemoryBinaryService {
    pub fn new() -> Self {
        Self {
            contents: Arc::new(RwLock::new(HashMap::new())),
            generator: IdentifierGenerator::flat("trellis:binary/"),
        }
    }
}

impl Default for MemoryBinaryService {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl BinaryService for MemoryBinaryService {
    type Handle = MemoryBinary;

    async fn get(&self, identifier: &Iri) -> Result<MemoryBinary> {
        Ok(MemoryBinary {
            identifier: identifier.clone(),
            contents: self.contents.clone(),
        })
    }

    async fn set_content(&self, metadata: &BinaryMetadata, mut stream: BinaryReader) -> Result<()> {
        let mut data = Vec::new();
        stream
            .read_to_end(&mut data)
            .await
            .map_err(BinaryError::io(&metadata.identifier))?;

        let mut declared = DeclaredDigests::new(&metadata.digests);
        declared.update(&data);
        declared.verify(metadata.identifier.as_str())?;

        self.contents
            .write()
            .map_err(|e| BinaryError::Poisoned(e.to_string()))?
            .insert(metadata.identifier.clone(), Bytes::from(data));
        Ok(())
    }

    async fn purge_content(&self, identifier: &Iri) -> Result<()> {
        let removed = self
            .contents
            .write()
            .map_err(|e| BinaryError::Poisoned(e.to_string()))?
            .remove(identifier);
        if removed.is_none() {
            tracing::warn!(%identifier, "purge of absent binary content");
        }
        Ok(())
    }

    async fn calculate_digest(
        &self,
        identifier: &Iri,
        algorithm: DigestAlgorithm,
    ) -> Result<Digest> {
        Ok(algorithm.digest(&lookup(&self.contents, identifier)?))
    }

    fn supported_algorithms(&self) -> BTreeSet<DigestAlgorithm> {
        DigestAlgorithm::ALL.into_iter().collect()
    }

    fn generate_identifier(&self) -> String {
        self.generator.generate()
    }
}

/// Lazy handle into a [`MemoryBinaryService`].
pub struct MemoryBinary {
    identifier: Iri,
    contents: Contents,
}

#[async_trait]
impl Binary for MemoryBinary {
    fn identifier(&self) -> &Iri {
        &self.identifier
    }

    async fn content(&self) -> Result<BinaryReader> {
        Ok(Box::new(Cursor::new(lookup(&self.contents, &self.identifier)?)))
    }

    async fn content_range(&self, from: u64, to: u64) -> Result<BinaryReader> {
        if to < from {
            return Err(BinaryError::InvalidArgument(format!(
                "byte range {}-{} is reversed",
                from, to
            )));
        }

        let bytes = lookup(&self.contents, &self.identifier)?;
        let len = bytes.len();
        let start = usize::try_from(from).unwrap_or(usize::MAX).min(len);
        let end = usize::try_from(to)
            .unwrap_or(usize::MAX)
            .saturating_add(1)
            .min(len);
        Ok(Box::new(Cursor::new(bytes.slice(start..end))))
    }

    async fn size(&self) -> Result<u64> {
        Ok(lookup(&self.contents, &self.identifier)?.len() as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn iri(s: impl Into<String>) -> Iri {
        Iri::new(s).unwrap()
    }

    async fn read_all(mut r: BinaryReader) -> Vec<u8> {
        let mut out = Vec::new();
        r.read_to_end(&mut out).await.unwrap();
        out
    }

    #[tokio::test]
    async fn test_roundtrip_and_range() {
        let service = MemoryBinaryService::new();
        let id = iri(service.generate_identifier());
        let md = BinaryMetadata::new(id.clone());

        service
            .set_content(&md, Box::new(&b"0123456789"[..]))
            .await
            .unwrap();

        let binary = service.get(&id).await.unwrap();
        assert_eq!(binary.size().await.unwrap(), 10);
        assert_eq!(read_all(binary.content().await.unwrap()).await, b"0123456789");
        assert_eq!(read_all(binary.content_range(2, 4).await.unwrap()).await, b"234");
        assert_eq!(read_all(binary.content_range(8, 50).await.unwrap()).await, b"89");
    }

    #[tokio::test]
    async fn test_handle_is_lazy() {
        let service = MemoryBinaryService::new();
        let id = iri("trellis:binary/later");

        let binary = service.get(&id).await.unwrap();
        assert!(matches!(binary.content().await, Err(e) if e.is_not_found()));

        service
            .set_content(&BinaryMetadata::new(id), Box::new(&b"now"[..]))
            .await
            .unwrap();
        assert_eq!(read_all(binary.content().await.unwrap()).await, b"now");
    }

    #[tokio::test]
    async fn test_digest_and_purge() {
        let service = MemoryBinaryService::new();
        let id = iri(service.generate_identifier());
        let md = BinaryMetadata::new(id.clone());

        let digest = service
            .set_content_with_digest(&md, Box::new(&b"abc"[..]), DigestAlgorithm::Sha384)
            .await
            .unwrap();
        assert_eq!(digest, DigestAlgorithm::Sha384.digest(b"abc"));
        assert_eq!(
            service.calculate_digest(&id, DigestAlgorithm::Sha384).await.unwrap(),
            digest
        );

        service.purge_content(&id).await.unwrap();
        service.purge_content(&id).await.unwrap();
        assert!(service
            .calculate_digest(&id, DigestAlgorithm::Sha384)
            .await
            .unwrap_err()
            .is_not_found());
    }
}
