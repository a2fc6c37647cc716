//! Domain model structs for the conversation store.
//!
//! Every struct derives `Serialize` and `Deserialize` so it can be handed
//! directly to a presentation layer. The flat records actually persisted
//! in the document tree are produced by [`crate::codec`], not by these
//! derives.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use palaver_shared::{ConversationId, Identity, UserKey};

// ---------------------------------------------------------------------------
// User
// ---------------------------------------------------------------------------

/// A registered account as stored at the user's own node. Created once at
/// registration and immutable thereafter.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct UserRecord {
    pub first_name: String,
    pub last_name: String,
    /// Raw email address; the storage key is derived from it.
    pub email: String,
}

impl UserRecord {
    pub fn new(
        first_name: impl Into<String>,
        last_name: impl Into<String>,
        email: impl Into<String>,
    ) -> Self {
        Self {
            first_name: first_name.into(),
            last_name: last_name.into(),
            email: email.into(),
        }
    }

    pub fn user_key(&self) -> UserKey {
        UserKey::from_email(&self.email)
    }

    /// Display name listed in the contact directory.
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }

    pub fn profile_picture_file_name(&self) -> String {
        self.user_key().profile_picture_file_name()
    }
}

/// One entry of the flat contact directory at the `users` node. `email`
/// holds the storage-safe key, not the raw address.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct DirectoryEntry {
    pub name: String,
    pub email: String,
}

// ---------------------------------------------------------------------------
// Conversation
// ---------------------------------------------------------------------------

/// Snapshot of the newest message, embedded in a conversation summary.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LatestMessage {
    pub date: DateTime<Utc>,
    /// Encoded content of the message (text, URL, or coordinate pair).
    pub text: String,
    pub is_read: bool,
}

/// One participant's view of a conversation.
///
/// Each conversation exists twice, once in each participant's list, as
/// independently mutable copies joined only by `id`. Every write path
/// that appends a message updates `latest_message` in both copies, but
/// there is no transaction spanning them.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ConversationSummary {
    pub id: ConversationId,
    /// Storage key of the other participant.
    pub counterpart_key: UserKey,
    /// Display name shown for the other participant.
    pub counterpart_name: String,
    pub latest_message: LatestMessage,
}

// ---------------------------------------------------------------------------
// Message
// ---------------------------------------------------------------------------

/// A single chat message. Created once when sent; only `is_read` may
/// change afterwards; individual messages are never deleted.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Message {
    pub id: String,
    /// Storage key of the sender.
    pub sender: UserKey,
    /// Sender's display name at send time.
    pub sender_name: String,
    pub sent_at: DateTime<Utc>,
    pub is_read: bool,
    pub content: MessageContent,
}

impl Message {
    /// A new unread message from `sender`, with a generated id and the
    /// current time.
    pub fn compose(sender: &Identity, content: MessageContent) -> Self {
        Self::with_id(Uuid::new_v4().to_string(), sender, Utc::now(), content)
    }

    /// A new unread message with a caller-chosen id and timestamp.
    pub fn with_id(
        id: impl Into<String>,
        sender: &Identity,
        sent_at: DateTime<Utc>,
        content: MessageContent,
    ) -> Self {
        Self {
            id: id.into(),
            sender: sender.user_key(),
            sender_name: sender.display_name.clone(),
            sent_at,
            is_read: false,
            content,
        }
    }

    /// Snapshot of this message for a summary's `latest_message` field.
    pub fn latest_message(&self) -> LatestMessage {
        LatestMessage {
            date: self.sent_at,
            text: self.content.encoded(),
            is_read: self.is_read,
        }
    }
}

/// Typed message payload.
///
/// The set of kinds is closed: these four are the kinds with a defined
/// wire encoding, and a kind without one cannot be constructed. Records
/// read back with any other `type` tag fail to decode and are dropped.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub enum MessageContent {
    /// Plain text; the content field carries the literal text.
    Text(String),
    /// A photo previously uploaded through the blob façade.
    Photo { url: String },
    /// A video previously uploaded through the blob façade.
    Video { url: String },
    /// A geographic position, persisted as `"longitude,latitude"`.
    Location { longitude: f64, latitude: f64 },
}

impl MessageContent {
    /// Wire tag for this kind.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Text(_) => "text",
            Self::Photo { .. } => "photo",
            Self::Video { .. } => "video",
            Self::Location { .. } => "location",
        }
    }

    /// Flat content string persisted for this payload.
    pub fn encoded(&self) -> String {
        match self {
            Self::Text(text) => text.clone(),
            Self::Photo { url } | Self::Video { url } => url.clone(),
            Self::Location {
                longitude,
                latitude,
            } => format!("{longitude},{latitude}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn full_name_and_key() {
        let user = UserRecord::new("Alice", "Anders", "a.b@x.com");
        assert_eq!(user.full_name(), "Alice Anders");
        assert_eq!(user.user_key().as_str(), "a_b_x_com");
        assert_eq!(
            user.profile_picture_file_name(),
            "a_b_x_com_profile_picture.png"
        );
    }

    #[test]
    fn content_kinds_and_encoding() {
        assert_eq!(MessageContent::Text("hi".into()).kind(), "text");
        assert_eq!(MessageContent::Text("hi".into()).encoded(), "hi");

        let photo = MessageContent::Photo {
            url: "file:///p.png".into(),
        };
        assert_eq!(photo.kind(), "photo");
        assert_eq!(photo.encoded(), "file:///p.png");

        let location = MessageContent::Location {
            longitude: 139.69,
            latitude: 35.68,
        };
        assert_eq!(location.kind(), "location");
        assert_eq!(location.encoded(), "139.69,35.68");
    }

    #[test]
    fn composed_message_is_unread() {
        let sender = Identity::new("a@x.com", "Alice A");
        let message = Message::compose(&sender, MessageContent::Text("hi".into()));
        assert!(!message.is_read);
        assert!(!message.id.is_empty());
        assert_eq!(message.sender.as_str(), "a_x_com");
        assert_eq!(message.sender_name, "Alice A");
    }
}
