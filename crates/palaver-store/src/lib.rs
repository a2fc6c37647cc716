//! # palaver-store
//!
//! The conversation store: a two-party message history kept as two
//! independently-stored copies (one summary entry per participant node)
//! of the same logical conversation over a remote JSON document tree,
//! with no server-side transactions. The crate exposes a [`Database`]
//! handle constructed from injected [`DocumentStore`] and auth
//! collaborators, plus typed CRUD helpers for the contact directory,
//! conversations and messages.
//!
//! The layout of the tree is fixed: `/{safeEmail}` holds a participant's
//! record and conversation list, `/users` the flat contact directory,
//! `/{conversationId}/messages` the shared message sequence.

pub mod codec;
pub mod conversations;
pub mod database;
pub mod directory;
pub mod document;
pub mod memory;
pub mod messages;
pub mod models;

mod error;

pub use conversations::SummaryStream;
pub use database::Database;
pub use document::{DocumentStore, ValueStream};
pub use error::{Result, StoreError};
pub use memory::MemoryDocumentStore;
pub use messages::MessageStream;
pub use models::*;
