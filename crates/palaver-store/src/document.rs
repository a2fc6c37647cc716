//! The document-tree interface the store is written against.
//!
//! Palaver does not own a storage engine. It issues reads and full-node
//! writes against a JSON-shaped tree addressed by string paths, and
//! subscribes to paths for live updates. Any backend that can honor
//! those three operations can host a Palaver store; the crate ships
//! [`MemoryDocumentStore`](crate::memory::MemoryDocumentStore) as the
//! in-process implementation.

use async_trait::async_trait;
use futures::stream::BoxStream;
use serde_json::Value;

use crate::error::Result;

/// Stream of values delivered by [`DocumentStore::observe`].
pub type ValueStream = BoxStream<'static, Value>;

/// A remote JSON document tree addressed by string paths.
///
/// Writes replace the whole node at a path; there is no partial update,
/// no transaction spanning paths and no optimistic concurrency token.
/// Two concurrent read-modify-write cycles against the same path are
/// last-writer-wins, which every caller of this trait must account for.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Fetch the current value at `path`.
    ///
    /// Fails with [`StoreError::NotFound`](crate::StoreError::NotFound)
    /// when nothing is stored there.
    async fn read_once(&self, path: &str) -> Result<Value>;

    /// Replace the node at `path` with `value`.
    async fn write_full(&self, path: &str, value: Value) -> Result<()>;

    /// Subscribe to `path`: the stream yields the current value first
    /// (when one exists), then every subsequent full write to the path.
    async fn observe(&self, path: &str) -> Result<ValueStream>;
}
