//! The [`Database`] handle.
//!
//! All conversation-store and directory operations hang off this struct;
//! the per-domain impl blocks live in `directory.rs`, `conversations.rs`
//! and `messages.rs`. Both collaborators are injected at construction so
//! the whole store runs against in-memory fakes in tests.

use std::sync::Arc;

use tracing::debug;

use palaver_shared::{AuthProvider, Identity};

use crate::document::DocumentStore;
use crate::error::{Result, StoreError};

/// Handle over the remote document tree and the auth backend.
///
/// Cheap to clone; clones share the underlying collaborators.
#[derive(Clone)]
pub struct Database {
    documents: Arc<dyn DocumentStore>,
    auth: Arc<dyn AuthProvider>,
}

impl Database {
    pub fn new(documents: Arc<dyn DocumentStore>, auth: Arc<dyn AuthProvider>) -> Self {
        debug!("database handle created");
        Self { documents, auth }
    }

    /// The underlying document store.
    pub fn documents(&self) -> &dyn DocumentStore {
        self.documents.as_ref()
    }

    /// Who is currently signed in, if anyone.
    pub fn current_identity(&self) -> Option<Identity> {
        self.auth.current_identity()
    }

    /// The signed-in identity, or [`StoreError::NotSignedIn`].
    pub(crate) fn require_identity(&self) -> Result<Identity> {
        self.current_identity().ok_or(StoreError::NotSignedIn)
    }
}
