//! # palaver-shared
//!
//! Identity and naming primitives shared by every Palaver crate: the
//! storage-safe [`UserKey`] derived from an email address, the
//! [`ConversationId`] that joins a participant's conversation list to the
//! shared message sequence, and the [`AuthProvider`] seam through which
//! the store learns who is signed in.

pub mod constants;
pub mod identity;
pub mod types;

pub use identity::{AuthProvider, Identity, StaticAuthProvider};
pub use types::{ConversationId, UserKey};
