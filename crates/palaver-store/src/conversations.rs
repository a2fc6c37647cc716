//! Conversation lifecycle: create, look up, list, observe, delete.
//!
//! A conversation is stored as two independently-written summary entries
//! (one per participant node) plus a shared message sequence. There is no
//! transaction spanning the three documents: a failed sub-write leaves
//! the copies inconsistent, and nothing here retries or rolls back.

use futures::stream::BoxStream;
use futures::StreamExt;
use serde_json::Value;
use tracing::{debug, info, warn};

use palaver_shared::{ConversationId, UserKey};

use crate::codec;
use crate::database::Database;
use crate::error::{Result, StoreError};
use crate::models::{ConversationSummary, Message};

/// Live, decoded view of one participant's conversation list.
pub type SummaryStream = BoxStream<'static, Vec<ConversationSummary>>;

impl Database {
    /// Start a conversation with `counterpart_email` and seed it with
    /// `first_message`. The id is derived from the first message's id and
    /// stays fixed for the life of the conversation.
    ///
    /// The mirror entry on the counterpart's node is written best-effort:
    /// a failure there is logged and swallowed, leaving only the
    /// counterpart's copy behind. A failure on the caller's own node or
    /// on the message sequence fails the whole call, without undoing the
    /// sub-writes that already landed.
    pub async fn create_conversation(
        &self,
        counterpart_email: &str,
        counterpart_name: &str,
        first_message: &Message,
    ) -> Result<ConversationId> {
        let identity = self.require_identity()?;
        let self_key = identity.user_key();
        let counterpart_key = UserKey::from_email(counterpart_email);
        let conversation_id = ConversationId::for_first_message(&first_message.id);
        let latest = first_message.latest_message();

        let mirror_summary = ConversationSummary {
            id: conversation_id.clone(),
            counterpart_key: self_key.clone(),
            counterpart_name: identity.display_name.clone(),
            latest_message: latest.clone(),
        };
        if let Err(error) = self.append_summary(&counterpart_key, &mirror_summary).await {
            warn!(
                conversation = %conversation_id,
                counterpart = %counterpart_key,
                %error,
                "counterpart summary write failed"
            );
        }

        // The caller must already be registered.
        let self_summary = ConversationSummary {
            id: conversation_id.clone(),
            counterpart_key,
            counterpart_name: counterpart_name.to_string(),
            latest_message: latest,
        };
        let node_path = self_key.node_path();
        let mut node = self.documents().read_once(&node_path).await?;
        conversations_mut(&mut node)?.push(codec::encode_summary(&self_summary));
        self.documents().write_full(&node_path, node).await?;

        let sequence = Value::Array(vec![codec::encode_message(first_message)]);
        self.documents()
            .write_full(&conversation_id.messages_path(), sequence)
            .await?;

        info!(conversation = %conversation_id, "created conversation");
        Ok(conversation_id)
    }

    /// Id of an existing conversation between the signed-in user and
    /// `counterpart_email`, if any.
    ///
    /// Scans the counterpart's summary list for the first entry pointing
    /// back at the caller; corrupted data holding several such entries is
    /// not deduplicated, the first positional match wins.
    pub async fn find_conversation(
        &self,
        counterpart_email: &str,
    ) -> Result<Option<ConversationId>> {
        let self_key = self.require_identity()?.user_key();
        let counterpart_key = UserKey::from_email(counterpart_email);

        let node = match self
            .documents()
            .read_once(&counterpart_key.node_path())
            .await
        {
            Ok(node) => node,
            Err(StoreError::NotFound(_)) => return Ok(None),
            Err(error) => return Err(error),
        };

        let summaries = node
            .get("conversations")
            .map(codec::decode_summaries)
            .unwrap_or_default();
        Ok(summaries
            .into_iter()
            .find(|summary| summary.counterpart_key == self_key)
            .map(|summary| summary.id))
    }

    /// Decoded conversation list of `key`, malformed entries dropped.
    pub async fn conversations_for(&self, key: &UserKey) -> Result<Vec<ConversationSummary>> {
        let node = self.documents().read_once(&key.node_path()).await?;
        Ok(node
            .get("conversations")
            .map(codec::decode_summaries)
            .unwrap_or_default())
    }

    /// Live conversation list of `key`: current state first, then an
    /// update per write to the node.
    pub async fn observe_conversations(&self, key: &UserKey) -> Result<SummaryStream> {
        let stream = self.documents().observe(&key.node_path()).await?;
        Ok(stream
            .map(|node| {
                node.get("conversations")
                    .map(codec::decode_summaries)
                    .unwrap_or_default()
            })
            .boxed())
    }

    /// Remove `conversation_id` from the signed-in user's own list.
    ///
    /// One-sided: the counterpart's mirrored entry and the shared message
    /// sequence are left in place.
    pub async fn delete_conversation(&self, conversation_id: &ConversationId) -> Result<()> {
        let self_key = self.require_identity()?.user_key();
        let node_path = self_key.node_path();
        let mut node = self.documents().read_once(&node_path).await?;

        let Some(entries) = node
            .get_mut("conversations")
            .and_then(Value::as_array_mut)
        else {
            debug!(conversation = %conversation_id, "no conversation list to delete from");
            return Ok(());
        };

        if let Some(position) = summary_position(entries, conversation_id) {
            entries.remove(position);
            self.documents().write_full(&node_path, node).await?;
            info!(conversation = %conversation_id, user = %self_key, "deleted conversation");
        }
        Ok(())
    }

    /// Append `summary` to `key`'s conversation list, creating the list
    /// or the whole node when absent.
    pub(crate) async fn append_summary(
        &self,
        key: &UserKey,
        summary: &ConversationSummary,
    ) -> Result<()> {
        let node_path = key.node_path();
        let mut node = match self.documents().read_once(&node_path).await {
            Ok(node) => node,
            Err(StoreError::NotFound(_)) => Value::Object(Default::default()),
            Err(error) => return Err(error),
        };
        conversations_mut(&mut node)?.push(codec::encode_summary(summary));
        self.documents().write_full(&node_path, node).await
    }
}

/// The mutable `conversations` list of a user node, created when absent.
pub(crate) fn conversations_mut(node: &mut Value) -> Result<&mut Vec<Value>> {
    let fields = node
        .as_object_mut()
        .ok_or_else(|| StoreError::Decode("user node is not an object".to_string()))?;
    fields
        .entry("conversations")
        .or_insert_with(|| Value::Array(Vec::new()))
        .as_array_mut()
        .ok_or_else(|| StoreError::Decode("conversations field is not a list".to_string()))
}

/// Position of the first entry with the given id, if any.
pub(crate) fn summary_position(entries: &[Value], id: &ConversationId) -> Option<usize> {
    entries
        .iter()
        .position(|entry| entry.get("id").and_then(Value::as_str) == Some(id.as_str()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use chrono::{TimeZone, Utc};
    use serde_json::json;

    use palaver_shared::{Identity, StaticAuthProvider};

    use crate::document::DocumentStore;
    use crate::memory::MemoryDocumentStore;
    use crate::models::{MessageContent, UserRecord};

    fn alice() -> Identity {
        Identity::new("a@x.com", "Alice Anders")
    }

    fn bob() -> Identity {
        Identity::new("b@x.com", "Bob Breve")
    }

    async fn two_user_setup() -> (Arc<MemoryDocumentStore>, Database, Database) {
        let documents = Arc::new(MemoryDocumentStore::new());
        let db_alice = Database::new(
            documents.clone(),
            Arc::new(StaticAuthProvider::signed_in(alice())),
        );
        let db_bob = Database::new(
            documents.clone(),
            Arc::new(StaticAuthProvider::signed_in(bob())),
        );

        db_alice
            .register_user(&UserRecord::new("Alice", "Anders", "a@x.com"))
            .await
            .unwrap();
        db_bob
            .register_user(&UserRecord::new("Bob", "Breve", "b@x.com"))
            .await
            .unwrap();

        (documents, db_alice, db_bob)
    }

    fn first_message() -> Message {
        Message::with_id(
            "m1",
            &alice(),
            Utc.with_ymd_and_hms(2024, 2, 4, 12, 30, 0).unwrap(),
            MessageContent::Text("hi".into()),
        )
    }

    #[tokio::test]
    async fn create_seeds_both_summaries_and_the_sequence() {
        let (_documents, db_alice, _db_bob) = two_user_setup().await;

        let id = db_alice
            .create_conversation("b@x.com", "Bob Breve", &first_message())
            .await
            .unwrap();
        assert_eq!(id.as_str(), "conversation_m1");

        let alice_list = db_alice
            .conversations_for(&UserKey::from_email("a@x.com"))
            .await
            .unwrap();
        assert_eq!(alice_list.len(), 1);
        assert_eq!(alice_list[0].id, id);
        assert_eq!(alice_list[0].counterpart_key.as_str(), "b_x_com");
        assert_eq!(alice_list[0].counterpart_name, "Bob Breve");
        assert_eq!(alice_list[0].latest_message.text, "hi");
        assert!(!alice_list[0].latest_message.is_read);

        let bob_list = db_alice
            .conversations_for(&UserKey::from_email("b@x.com"))
            .await
            .unwrap();
        assert_eq!(bob_list.len(), 1);
        assert_eq!(bob_list[0].id, id);
        // The mirror entry points back at the sender, under the sender's name.
        assert_eq!(bob_list[0].counterpart_key.as_str(), "a_x_com");
        assert_eq!(bob_list[0].counterpart_name, "Alice Anders");

        let messages = db_alice.messages_for(&id).await.unwrap();
        assert_eq!(messages.len(), 1);
        assert_eq!(messages[0].id, "m1");
        assert_eq!(messages[0].content, MessageContent::Text("hi".into()));
        assert_eq!(messages[0].sender.as_str(), "a_x_com");
    }

    #[tokio::test]
    async fn create_appends_to_existing_lists() {
        let (_documents, db_alice, _db_bob) = two_user_setup().await;

        db_alice
            .create_conversation("b@x.com", "Bob Breve", &first_message())
            .await
            .unwrap();

        let second = Message::with_id(
            "m9",
            &alice(),
            Utc.with_ymd_and_hms(2024, 2, 5, 9, 0, 0).unwrap(),
            MessageContent::Text("again".into()),
        );
        db_alice
            .create_conversation("b@x.com", "Bob Breve", &second)
            .await
            .unwrap();

        for key in ["a@x.com", "b@x.com"] {
            let list = db_alice
                .conversations_for(&UserKey::from_email(key))
                .await
                .unwrap();
            assert_eq!(list.len(), 2);
        }
    }

    #[tokio::test]
    async fn create_requires_a_signed_in_user() {
        let documents = Arc::new(MemoryDocumentStore::new());
        let db = Database::new(documents, Arc::new(StaticAuthProvider::signed_out()));

        let result = db
            .create_conversation("b@x.com", "Bob Breve", &first_message())
            .await;
        assert!(matches!(result, Err(StoreError::NotSignedIn)));
    }

    #[tokio::test]
    async fn create_fails_when_own_node_is_missing() {
        let documents = Arc::new(MemoryDocumentStore::new());
        let db_alice = Database::new(
            documents.clone(),
            Arc::new(StaticAuthProvider::signed_in(alice())),
        );

        let result = db_alice
            .create_conversation("b@x.com", "Bob Breve", &first_message())
            .await;
        assert!(matches!(result, Err(StoreError::NotFound(_))));

        // The best-effort mirror write already landed; nothing rolls it back.
        let bob_node = documents.read_once("b_x_com").await.unwrap();
        assert_eq!(bob_node["conversations"].as_array().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn counterpart_write_failure_is_swallowed() {
        let (documents, db_alice, _db_bob) = two_user_setup().await;
        documents.fail_next_write_to("b_x_com");

        let id = db_alice
            .create_conversation("b@x.com", "Bob Breve", &first_message())
            .await
            .unwrap();

        // Self side and sequence are complete, the counterpart copy is not.
        assert_eq!(
            db_alice
                .conversations_for(&UserKey::from_email("a@x.com"))
                .await
                .unwrap()
                .len(),
            1
        );
        assert_eq!(db_alice.messages_for(&id).await.unwrap().len(), 1);
        assert!(db_alice
            .conversations_for(&UserKey::from_email("b@x.com"))
            .await
            .unwrap()
            .is_empty());
    }

    #[tokio::test]
    async fn own_write_failure_fails_create_but_keeps_mirror() {
        let (documents, db_alice, _db_bob) = two_user_setup().await;
        documents.fail_next_write_to("a_x_com");

        let result = db_alice
            .create_conversation("b@x.com", "Bob Breve", &first_message())
            .await;
        assert!(matches!(result, Err(StoreError::WriteFailed { .. })));

        // The mirror entry was written first and stays behind.
        assert_eq!(
            db_alice
                .conversations_for(&UserKey::from_email("b@x.com"))
                .await
                .unwrap()
                .len(),
            1
        );
        assert!(db_alice
            .conversations_for(&UserKey::from_email("a@x.com"))
            .await
            .unwrap()
            .is_empty());
        assert!(matches!(
            documents.read_once("conversation_m1/messages").await,
            Err(StoreError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn find_conversation_in_both_directions() {
        let (_documents, db_alice, db_bob) = two_user_setup().await;

        assert!(db_alice
            .find_conversation("b@x.com")
            .await
            .unwrap()
            .is_none());

        let id = db_alice
            .create_conversation("b@x.com", "Bob Breve", &first_message())
            .await
            .unwrap();

        assert_eq!(db_alice.find_conversation("b@x.com").await.unwrap(), Some(id.clone()));
        assert_eq!(db_bob.find_conversation("a@x.com").await.unwrap(), Some(id));
        assert!(db_alice
            .find_conversation("stranger@x.com")
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn find_takes_the_first_positional_match() {
        let (documents, _db_alice, db_bob) = two_user_setup().await;

        // Corrupted data: two entries for the same counterpart.
        let entry = |id: &str| {
            json!({
                "id": id,
                "name": "Bob Breve",
                "other_user_email": "b_x_com",
                "latest_message": {
                    "date": "2024-02-04T12:30:00+00:00",
                    "message": "hi",
                    "is_read": false,
                },
            })
        };
        documents
            .write_full(
                "a_x_com",
                json!({
                    "first_name": "Alice",
                    "last_name": "Anders",
                    "conversations": [entry("conversation_m1"), entry("conversation_m2")],
                }),
            )
            .await
            .unwrap();

        let found = db_bob.find_conversation("a@x.com").await.unwrap();
        assert_eq!(found.unwrap().as_str(), "conversation_m1");
    }

    #[tokio::test]
    async fn delete_is_one_sided() {
        let (_documents, db_alice, _db_bob) = two_user_setup().await;
        let id = db_alice
            .create_conversation("b@x.com", "Bob Breve", &first_message())
            .await
            .unwrap();

        db_alice.delete_conversation(&id).await.unwrap();

        assert!(db_alice
            .conversations_for(&UserKey::from_email("a@x.com"))
            .await
            .unwrap()
            .is_empty());
        // The counterpart's copy and the shared sequence survive.
        assert_eq!(
            db_alice
                .conversations_for(&UserKey::from_email("b@x.com"))
                .await
                .unwrap()
                .len(),
            1
        );
        assert_eq!(db_alice.messages_for(&id).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn delete_of_unknown_id_is_a_no_op() {
        let (_documents, db_alice, _db_bob) = two_user_setup().await;
        db_alice
            .create_conversation("b@x.com", "Bob Breve", &first_message())
            .await
            .unwrap();

        db_alice
            .delete_conversation(&ConversationId::from_raw("conversation_missing"))
            .await
            .unwrap();
        assert_eq!(
            db_alice
                .conversations_for(&UserKey::from_email("a@x.com"))
                .await
                .unwrap()
                .len(),
            1
        );
    }

    #[tokio::test]
    async fn observe_conversations_tracks_updates() {
        use futures::StreamExt;

        let (_documents, db_alice, _db_bob) = two_user_setup().await;
        let alice_key = UserKey::from_email("a@x.com");

        let mut stream = db_alice.observe_conversations(&alice_key).await.unwrap();
        // Registered but no conversations yet.
        assert_eq!(stream.next().await.unwrap(), Vec::new());

        db_alice
            .create_conversation("b@x.com", "Bob Breve", &first_message())
            .await
            .unwrap();
        let update = stream.next().await.unwrap();
        assert_eq!(update.len(), 1);
        assert_eq!(update[0].latest_message.text, "hi");
    }
}
