//! Digests computed in the same pass as a write.
//!
//! [`DigestReader`] wraps any `AsyncRead` and feeds every byte it yields into
//! one or more hashers. The bytes a store consumes are exactly the bytes that
//! get hashed, so the resulting digest always describes what was written.

use std::io;
use std::pin::Pin;
use std::sync::{Arc, Mutex};
use std::task::{ready, Context, Poll};

use tokio::io::{AsyncRead, ReadBuf};
use trellis_core::{Digest, DigestAlgorithm, Hasher};

use crate::error::{BinaryError, Result};

/// An `AsyncRead` adapter that hashes everything read through it.
pub struct DigestReader<R> {
    inner: R,
    hashers: Arc<Mutex<Vec<Hasher>>>,
}

/// Retrieves the digests once the paired reader has been consumed.
#[derive(Debug, Clone)]
pub struct DigestHandle {
    hashers: Arc<Mutex<Vec<Hasher>>>,
}

impl<R> DigestReader<R> {
    /// Wrap `inner`, hashing with each of `algorithms`.
    pub fn new(inner: R, algorithms: &[DigestAlgorithm]) -> (Self, DigestHandle) {
        let hashers = Arc::new(Mutex::new(
            algorithms.iter().map(DigestAlgorithm::hasher).collect(),
        ));
        let handle = DigestHandle {
            hashers: hashers.clone(),
        };
        (Self { inner, hashers }, handle)
    }
}

impl<R: AsyncRead + Unpin> AsyncRead for DigestReader<R> {
    fn poll_read(
        mut self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &mut ReadBuf<'_>,
    ) -> Poll<io::Result<()>> {
        let before = buf.filled().len();
        ready!(Pin::new(&mut self.inner).poll_read(cx, buf))?;

        let read = &buf.filled()[before..];
        if !read.is_empty() {
            let mut hashers = self
                .hashers
                .lock()
                .map_err(|e| io::Error::other(e.to_string()))?;
            for hasher in hashers.iter_mut() {
                hasher.update(read);
            }
        }
        Poll::Ready(Ok(()))
    }
}

impl DigestHandle {
    /// Finalize every hasher, in the order the algorithms were given.
    ///
    /// Consumes the hasher state: calling this twice yields an empty list
    /// the second time.
    pub fn finish(&self) -> Result<Vec<Digest>> {
        let mut hashers = self
            .hashers
            .lock()
            .map_err(|e| BinaryError::Poisoned(e.to_string()))?;
        Ok(std::mem::take(&mut *hashers)
            .into_iter()
            .map(Hasher::finalize)
            .collect())
    }
}

/// Digests a caller declared for a write, checked against the bytes as they
/// stream through.
pub(crate) struct DeclaredDigests<'a> {
    declared: &'a [Digest],
    hashers: Vec<Hasher>,
}

impl<'a> DeclaredDigests<'a> {
    pub(crate) fn new(declared: &'a [Digest]) -> Self {
        Self {
            declared,
            hashers: declared.iter().map(|d| d.algorithm.hasher()).collect(),
        }
    }

    pub(crate) fn update(&mut self, data: &[u8]) {
        for hasher in &mut self.hashers {
            hasher.update(data);
        }
    }

    /// Fail on the first declared digest the content does not match.
    pub(crate) fn verify(self, identifier: &str) -> Result<()> {
        for (expected, hasher) in self.declared.iter().zip(self.hashers) {
            let actual = hasher.finalize();
            if &actual != expected {
                return Err(BinaryError::DigestMismatch {
                    identifier: identifier.to_string(),
                    algorithm: expected.algorithm,
                    expected: expected.to_hex(),
                    actual: actual.to_hex(),
                });
            }
        }
        Ok(())
    }
}
