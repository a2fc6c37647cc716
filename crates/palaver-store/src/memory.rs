//! In-memory [`DocumentStore`] backend.
//!
//! Holds the whole tree as a flat map from path to JSON value, which is
//! exactly the granularity the store reads and writes at. Subscriptions
//! are exact-path: a watcher on `a/messages` sees writes to `a/messages`
//! and nothing else.
//!
//! Writes can be made to fail on demand with
//! [`fail_next_write_to`](MemoryDocumentStore::fail_next_write_to) so the
//! partial-failure behavior of multi-step operations can be exercised
//! without a real backend.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::Mutex;

use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::mpsc;
use tracing::debug;

use crate::document::{DocumentStore, ValueStream};
use crate::error::{Result, StoreError};

/// Memory-backed document tree with exact-path subscriptions.
#[derive(Debug, Default)]
pub struct MemoryDocumentStore {
    nodes: Mutex<BTreeMap<String, Value>>,
    watchers: Mutex<HashMap<String, Vec<mpsc::UnboundedSender<Value>>>>,
    failing_writes: Mutex<HashSet<String>>,
}

impl MemoryDocumentStore {
    /// Empty tree.
    pub fn new() -> Self {
        Self::default()
    }

    /// Make the next write to `path` fail with
    /// [`StoreError::WriteFailed`]. One-shot: the write after the failed
    /// one goes through again.
    pub fn fail_next_write_to(&self, path: &str) {
        self.failing_writes
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .insert(path.to_string());
    }

    /// Number of nodes currently stored.
    pub fn len(&self) -> usize {
        self.nodes.lock().unwrap_or_else(|e| e.into_inner()).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn notify(&self, path: &str, value: &Value) {
        let mut watchers = self.watchers.lock().unwrap_or_else(|e| e.into_inner());
        if let Some(subscribers) = watchers.get_mut(path) {
            subscribers.retain(|tx| tx.send(value.clone()).is_ok());
        }
    }
}

#[async_trait]
impl DocumentStore for MemoryDocumentStore {
    async fn read_once(&self, path: &str) -> Result<Value> {
        self.nodes
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .get(path)
            .cloned()
            .ok_or_else(|| StoreError::NotFound(path.to_string()))
    }

    async fn write_full(&self, path: &str, value: Value) -> Result<()> {
        let injected = self
            .failing_writes
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .remove(path);
        if injected {
            debug!(path, "injected write failure");
            return Err(StoreError::WriteFailed {
                path: path.to_string(),
                reason: "injected write failure".to_string(),
            });
        }

        self.nodes
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .insert(path.to_string(), value.clone());
        self.notify(path, &value);
        Ok(())
    }

    async fn observe(&self, path: &str) -> Result<ValueStream> {
        let current = self
            .nodes
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .get(path)
            .cloned();

        let (tx, mut rx) = mpsc::unbounded_channel();
        if let Some(value) = current {
            // Delivered before any later write since the channel is ordered.
            let _ = tx.send(value);
        }
        self.watchers
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .entry(path.to_string())
            .or_default()
            .push(tx);

        Ok(Box::pin(futures::stream::poll_fn(move |cx| {
            rx.poll_recv(cx)
        })))
    }
}
