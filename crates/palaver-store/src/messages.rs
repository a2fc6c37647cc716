//! Message append and retrieval.
//!
//! The sequence is append-only and positional: order is the order records
//! were written, with no sequence numbers. Appending re-writes the whole
//! sequence after a read, so two concurrent appends against the same
//! conversation are last-writer-wins and one of them can be lost; the
//! lockstep test below pins that property down.

use futures::stream::BoxStream;
use futures::StreamExt;
use serde_json::Value;
use tracing::debug;

use palaver_shared::{ConversationId, UserKey};

use crate::codec;
use crate::conversations::{conversations_mut, summary_position};
use crate::database::Database;
use crate::error::{Result, StoreError};
use crate::models::{ConversationSummary, LatestMessage, Message};

/// Live, decoded view of a conversation's message sequence.
pub type MessageStream = BoxStream<'static, Vec<Message>>;

impl Database {
    /// Append `message` to an existing conversation and refresh the
    /// `latest_message` snapshot on both participants' summary entries.
    ///
    /// Fails with [`StoreError::NotFound`] when the conversation has no
    /// stored sequence. A failure in any later step fails the call;
    /// sub-writes that already landed stay in place, so the sequence can
    /// gain the message while a summary still shows the previous one.
    pub async fn send_message(
        &self,
        conversation_id: &ConversationId,
        counterpart_key: &UserKey,
        counterpart_name: &str,
        message: &Message,
    ) -> Result<()> {
        let identity = self.require_identity()?;
        let self_key = identity.user_key();

        // Whole-sequence read-modify-write; no concurrency token.
        let sequence_path = conversation_id.messages_path();
        let sequence = self.documents().read_once(&sequence_path).await?;
        let Value::Array(mut records) = sequence else {
            return Err(StoreError::Decode(format!(
                "message sequence at {sequence_path} is not a list"
            )));
        };
        records.push(codec::encode_message(message));
        self.documents()
            .write_full(&sequence_path, Value::Array(records))
            .await?;

        let latest = message.latest_message();

        let self_summary = ConversationSummary {
            id: conversation_id.clone(),
            counterpart_key: counterpart_key.clone(),
            counterpart_name: counterpart_name.to_string(),
            latest_message: latest.clone(),
        };
        self.refresh_latest(&self_key, conversation_id, &latest, &self_summary)
            .await?;

        // The mirror entry is named after the sender.
        let mirror_summary = ConversationSummary {
            id: conversation_id.clone(),
            counterpart_key: self_key,
            counterpart_name: identity.display_name.clone(),
            latest_message: latest.clone(),
        };
        self.refresh_latest(counterpart_key, conversation_id, &latest, &mirror_summary)
            .await?;

        debug!(conversation = %conversation_id, message = %message.id, "message appended");
        Ok(())
    }

    /// Decoded message sequence in append order, undecodable records
    /// dropped.
    pub async fn messages_for(&self, conversation_id: &ConversationId) -> Result<Vec<Message>> {
        let value = self
            .documents()
            .read_once(&conversation_id.messages_path())
            .await?;
        Ok(codec::decode_messages(&value))
    }

    /// Live message sequence: current state first, then an update per
    /// append.
    pub async fn observe_messages(&self, conversation_id: &ConversationId) -> Result<MessageStream> {
        let stream = self
            .documents()
            .observe(&conversation_id.messages_path())
            .await?;
        Ok(stream.map(|value| codec::decode_messages(&value)).boxed())
    }

    /// Overwrite the `latest_message` of `key`'s entry for the
    /// conversation, or append `fallback` when the entry is missing
    /// (self-healing for a list that lost it).
    async fn refresh_latest(
        &self,
        key: &UserKey,
        conversation_id: &ConversationId,
        latest: &LatestMessage,
        fallback: &ConversationSummary,
    ) -> Result<()> {
        let node_path = key.node_path();
        let mut node = self.documents().read_once(&node_path).await?;

        let entries = conversations_mut(&mut node)?;
        match summary_position(entries, conversation_id) {
            Some(position) => {
                let Some(entry) = entries[position].as_object_mut() else {
                    return Err(StoreError::Decode(
                        "conversation summary entry is not an object".to_string(),
                    ));
                };
                entry.insert(
                    "latest_message".to_string(),
                    codec::encode_latest_message(latest),
                );
            }
            None => entries.push(codec::encode_summary(fallback)),
        }

        self.documents().write_full(&node_path, node).await
    }
}
