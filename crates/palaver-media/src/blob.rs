//! The blob storage interface the façade is written against.

use async_trait::async_trait;
use bytes::Bytes;

use crate::error::Result;

/// A flat byte store addressed by relative string paths.
///
/// Implementations decide what a path resolves to (a file, an object
/// key, a remote bucket entry); the façade only requires that a payload
/// stored with [`put`](BlobStore::put) is later retrievable through the
/// URL returned by [`resolve_url`](BlobStore::resolve_url).
#[async_trait]
pub trait BlobStore: Send + Sync {
    /// Store `data` at `path`, replacing any previous payload.
    async fn put(&self, path: &str, data: Bytes) -> Result<()>;

    /// Retrievable URL for the payload at `path`.
    async fn resolve_url(&self, path: &str) -> Result<String>;
}
