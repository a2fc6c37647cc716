use serde::{Deserialize, Serialize};

use crate::constants::{CONVERSATION_ID_PREFIX, MESSAGES_NODE, PROFILE_PICTURE_SUFFIX};

/// Storage-safe user identifier derived from an email address.
///
/// The derivation replaces `.` and `@` with `_` so the key can be used as
/// a document path segment. It is pure and total: every input produces a
/// key, and the same email always produces the same key. Distinct emails
/// can collide (`a.b@c.com` and `a_b@c.com` map to the same key); that
/// risk is accepted by the naming scheme.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct UserKey(String);

impl UserKey {
    /// Derive the key for an email address. Never fails; validating the
    /// address is the caller's responsibility.
    pub fn from_email(email: &str) -> Self {
        Self(email.replace(['.', '@'], "_"))
    }

    /// Wrap a key string that was already derived (e.g. read back from
    /// the store's `other_user_email` field).
    pub fn from_raw(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Document path of this user's root node.
    pub fn node_path(&self) -> String {
        self.0.clone()
    }

    /// File name of this user's profile picture blob.
    pub fn profile_picture_file_name(&self) -> String {
        format!("{}{}", self.0, PROFILE_PICTURE_SUFFIX)
    }
}

impl std::fmt::Display for UserKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Identifier of a conversation, shared by both participants' summary
/// entries and the message sequence. Assigned once at creation from the
/// first message's id and stable thereafter; it is the sole join key
/// between a summary entry and the shared sequence.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct ConversationId(String);

impl ConversationId {
    /// Derive the id for a conversation from its first message.
    pub fn for_first_message(message_id: &str) -> Self {
        Self(format!("{CONVERSATION_ID_PREFIX}{message_id}"))
    }

    /// Wrap an id string read back from a summary entry.
    pub fn from_raw(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Document path of this conversation's message sequence.
    pub fn messages_path(&self) -> String {
        format!("{}/{}", self.0, MESSAGES_NODE)
    }
}

impl std::fmt::Display for ConversationId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}
