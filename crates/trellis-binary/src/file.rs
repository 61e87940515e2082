//! Sharded filesystem binary store.
//!
//! Content lives in a directory tree under a base path. Identifiers look like
//! `file:///ab/12/cd/ab12cd34...`; the part after the scheme, stripped of
//! leading slashes, is the path relative to the base. Leaf files hold raw
//! bytes with no envelope or sidecar metadata.
//!
//! ```text
//! {base}/
//!   ab/
//!     12/
//!       cd/
//!         ab12cd34ef...   <- the whole token is the file name
//! ```
//!
//! Writes land in a temporary sibling file which is synced and renamed over
//! the target, so readers never observe a torn file. Concurrent writers to
//! the same identifier race; the last rename wins.

use std::collections::BTreeSet;
use std::io::{ErrorKind, SeekFrom};
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::fs::{self, File};
use tokio::io::{AsyncReadExt, AsyncSeekExt, AsyncWriteExt};
use trellis_core::{
    random_token, trim_leading, BinaryMetadata, Digest, DigestAlgorithm, IdentifierGenerator, Iri,
};

use crate::config::FileBinaryConfig;
use crate::digest_reader::DeclaredDigests;
use crate::error::{BinaryError, Result};
use crate::service::{Binary, BinaryReader, BinaryService};

/// Identifier prefix for file-backed content.
pub const FILE_PREFIX: &str = "file:///";

const BUFFER_SIZE: usize = 8192;

/// Filesystem-backed [`BinaryService`].
#[derive(Debug, Clone)]
pub struct FileBinaryService {
    base_path: PathBuf,
    generator: IdentifierGenerator,
}

impl FileBinaryService {
    /// Store under `base_path` with the default 3 x 2 shard layout.
    pub fn new(base_path: impl Into<PathBuf>) -> Result<Self> {
        Self::from_config(&FileBinaryConfig::new(base_path))
    }

    /// Store under `base_path` with a custom shard layout.
    pub fn with_layout(
        base_path: impl Into<PathBuf>,
        hierarchy: usize,
        length: usize,
    ) -> Result<Self> {
        Self::from_config(&FileBinaryConfig {
            base_path: Some(base_path.into()),
            hierarchy,
            length,
        })
    }

    pub fn from_config(config: &FileBinaryConfig) -> Result<Self> {
        config.validate()?;
        let base_path = config
            .base_path
            .clone()
            .ok_or_else(|| BinaryError::Config("binary base path is required".into()))?;
        let generator = IdentifierGenerator::new(FILE_PREFIX, config.hierarchy, config.length)?;

        tracing::info!(
            base_path = %base_path.display(),
            hierarchy = config.hierarchy,
            length = config.length,
            "file binary store ready"
        );

        Ok(Self {
            base_path,
            generator,
        })
    }

    pub fn base_path(&self) -> &Path {
        &self.base_path
    }

    /// Map an identifier to its file path. Does no I/O.
    ///
    /// Fails for identifiers outside the `file:` scheme, with an empty path,
    /// or with `.`/`..`/empty segments that would escape or alias the layout.
    /// Percent-escapes, queries and fragments are rejected rather than
    /// decoded, so every accepted identifier names its file verbatim.
    pub fn resolve_path(&self, identifier: &Iri) -> Result<PathBuf> {
        let invalid = |reason| BinaryError::InvalidIdentifier {
            identifier: identifier.to_string(),
            reason,
        };

        if !identifier.has_scheme("file") {
            return Err(invalid("expected a file: identifier"));
        }

        let relative = trim_leading(identifier.scheme_specific_part(), "/");
        if relative.is_empty() {
            return Err(invalid("empty path"));
        }
        if relative.contains(['%', '?', '#']) {
            return Err(invalid("percent-escapes, queries and fragments are not allowed"));
        }

        let mut path = self.base_path.clone();
        for segment in relative.split('/') {
            if segment.is_empty() || segment == "." || segment == ".." || segment.contains('\\') {
                return Err(invalid("illegal path segment"));
            }
            path.push(segment);
        }
        Ok(path)
    }

    /// Stream `stream` into `temp`, syncing before returning.
    async fn write_temp(
        &self,
        temp: &Path,
        stream: &mut BinaryReader,
        metadata: &BinaryMetadata,
    ) -> Result<()> {
        let io_err = || BinaryError::io(&metadata.identifier);
        let mut declared = DeclaredDigests::new(&metadata.digests);
        let mut file = File::create(temp).await.map_err(io_err())?;
        let mut buf = vec![0u8; BUFFER_SIZE];

        loop {
            let n = stream.read(&mut buf).await.map_err(io_err())?;
            if n == 0 {
                break;
            }
            declared.update(&buf[..n]);
            file.write_all(&buf[..n]).await.map_err(io_err())?;
        }

        file.flush().await.map_err(io_err())?;
        file.sync_all().await.map_err(io_err())?;
        declared.verify(metadata.identifier.as_str())
    }
}

#[async_trait]
impl BinaryService for FileBinaryService {
    type Handle = FileBinary;

    async fn get(&self, identifier: &Iri) -> Result<FileBinary> {
        Ok(FileBinary {
            identifier: identifier.clone(),
            path: self.resolve_path(identifier)?,
        })
    }

    #[tracing::instrument(skip(self, metadata, stream), fields(identifier = %metadata.identifier))]
    async fn set_content(&self, metadata: &BinaryMetadata, mut stream: BinaryReader) -> Result<()> {
        let path = self.resolve_path(&metadata.identifier)?;
        let io_err = || BinaryError::io(&metadata.identifier);

        let (Some(parent), Some(name)) = (path.parent(), path.file_name()) else {
            return Err(BinaryError::InvalidIdentifier {
                identifier: metadata.identifier.to_string(),
                reason: "no file name",
            });
        };
        fs::create_dir_all(parent).await.map_err(io_err())?;

        let temp = parent.join(format!(
            ".{}.{}.tmp",
            name.to_string_lossy(),
            random_token()
        ));

        let written = match self.write_temp(&temp, &mut stream, metadata).await {
            Ok(()) => fs::rename(&temp, &path).await.map_err(io_err()),
            Err(e) => Err(e),
        };

        if let Err(e) = written {
            if let Err(cleanup) = fs::remove_file(&temp).await {
                if cleanup.kind() != ErrorKind::NotFound {
                    tracing::warn!(temp = %temp.display(), error = %cleanup, "failed to remove temp file");
                }
            }
            return Err(e);
        }

        tracing::debug!(path = %path.display(), "stored binary content");
        Ok(())
    }

    #[tracing::instrument(skip(self), fields(identifier = %identifier))]
    async fn purge_content(&self, identifier: &Iri) -> Result<()> {
        let path = self.resolve_path(identifier)?;

        match fs::remove_file(&path).await {
            Ok(()) => {
                tracing::debug!(path = %path.display(), "purged binary content");
                Ok(())
            }
            Err(e) if e.kind() == ErrorKind::NotFound => {
                tracing::warn!(path = %path.display(), "purge of absent binary content");
                Ok(())
            }
            Err(e) => match fs::metadata(&path).await {
                // A shard directory holds no content of its own.
                Ok(meta) if meta.is_dir() => {
                    tracing::warn!(path = %path.display(), "purge of shard directory ignored");
                    Ok(())
                }
                _ => Err(BinaryError::io(identifier)(e)),
            },
        }
    }

    #[tracing::instrument(skip(self), fields(identifier = %identifier, algorithm = %algorithm))]
    async fn calculate_digest(
        &self,
        identifier: &Iri,
        algorithm: DigestAlgorithm,
    ) -> Result<Digest> {
        let path = self.resolve_path(identifier)?;
        let mut file = open(identifier, &path).await?;

        let mut hasher = algorithm.hasher();
        let mut buf = vec![0u8; BUFFER_SIZE];
        loop {
            let n = file.read(&mut buf).await.map_err(BinaryError::io(identifier))?;
            if n == 0 {
                break;
            }
            hasher.update(&buf[..n]);
        }
        Ok(hasher.finalize())
    }

    fn supported_algorithms(&self) -> BTreeSet<DigestAlgorithm> {
        DigestAlgorithm::ALL.into_iter().collect()
    }

    fn generate_identifier(&self) -> String {
        self.generator.generate()
    }
}

/// Open stored content. Anything other than a regular file, such as a shard
/// directory, is not content.
async fn open(identifier: &Iri, path: &Path) -> Result<File> {
    let file = File::open(path).await.map_err(|e| {
        if e.kind() == ErrorKind::NotFound {
            BinaryError::NotFound(identifier.to_string())
        } else {
            BinaryError::io(identifier)(e)
        }
    })?;

    let meta = file.metadata().await.map_err(BinaryError::io(identifier))?;
    if !meta.is_file() {
        return Err(BinaryError::NotFound(identifier.to_string()));
    }
    Ok(file)
}

/// Lazy handle to a file in a [`FileBinaryService`].
#[derive(Debug, Clone)]
pub struct FileBinary {
    identifier: Iri,
    path: PathBuf,
}

impl FileBinary {
    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl Binary for FileBinary {
    fn identifier(&self) -> &Iri {
        &self.identifier
    }

    async fn content(&self) -> Result<BinaryReader> {
        Ok(Box::new(open(&self.identifier, &self.path).await?))
    }

    async fn content_range(&self, from: u64, to: u64) -> Result<BinaryReader> {
        if to < from {
            return Err(BinaryError::InvalidArgument(format!(
                "byte range {}-{} is reversed",
                from, to
            )));
        }

        let mut file = open(&self.identifier, &self.path).await?;
        file.seek(SeekFrom::Start(from))
            .await
            .map_err(BinaryError::io(&self.identifier))?;
        Ok(Box::new(file.take((to - from).saturating_add(1))))
    }

    async fn size(&self) -> Result<u64> {
        match fs::metadata(&self.path).await {
            Ok(meta) if meta.is_file() => Ok(meta.len()),
            Ok(_) => Err(BinaryError::NotFound(self.identifier.to_string())),
            Err(e) if e.kind() == ErrorKind::NotFound => {
                Err(BinaryError::NotFound(self.identifier.to_string()))
            }
            Err(e) => Err(BinaryError::io(&self.identifier)(e)),
        }
    }
}
