//! Codec between typed models and the flat records persisted in the
//! document tree.
//!
//! A message is stored as
//! `{ id, type, content, date, sender_email, is_read, name }`, a summary
//! entry as `{ id, name, other_user_email, latest_message }`. Dates are
//! RFC 3339 strings. Decoding is lenient at the sequence level: a record
//! that is missing fields, carries an unknown `type` tag, or fails to
//! parse is dropped from the produced list rather than failing the read.

use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::debug;

use palaver_shared::{ConversationId, UserKey};

use crate::models::{ConversationSummary, LatestMessage, Message, MessageContent};

// ---------------------------------------------------------------------------
// Messages
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct MessageRecord {
    id: String,
    #[serde(rename = "type")]
    kind: String,
    content: String,
    date: String,
    sender_email: String,
    is_read: bool,
    name: String,
}

/// Flat record for one message.
pub fn encode_message(message: &Message) -> Value {
    json!({
        "id": message.id,
        "type": message.content.kind(),
        "content": message.content.encoded(),
        "date": message.sent_at.to_rfc3339(),
        "sender_email": message.sender.as_str(),
        "is_read": message.is_read,
        "name": message.sender_name,
    })
}

/// Inverse of [`encode_message`]. `None` means the record is unusable
/// and must be dropped from the produced sequence.
pub fn decode_message(value: &Value) -> Option<Message> {
    let record: MessageRecord = serde_json::from_value(value.clone()).ok()?;

    let sent_at = parse_date(&record.date)?;
    let content = match record.kind.as_str() {
        "text" => MessageContent::Text(record.content),
        "photo" => MessageContent::Photo {
            url: record.content,
        },
        "video" => MessageContent::Video {
            url: record.content,
        },
        "location" => {
            let (longitude, latitude) = record.content.split_once(',')?;
            MessageContent::Location {
                longitude: longitude.trim().parse().ok()?,
                latitude: latitude.trim().parse().ok()?,
            }
        }
        // Kinds without a defined wire encoding.
        _ => return None,
    };

    Some(Message {
        id: record.id,
        sender: UserKey::from_raw(record.sender_email),
        sender_name: record.name,
        sent_at,
        is_read: record.is_read,
        content,
    })
}

/// Decode a stored message sequence, dropping undecodable records.
pub fn decode_messages(value: &Value) -> Vec<Message> {
    let Some(records) = value.as_array() else {
        return Vec::new();
    };
    records
        .iter()
        .filter_map(|record| {
            let message = decode_message(record);
            if message.is_none() {
                debug!(?record, "dropping undecodable message record");
            }
            message
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Conversation summaries
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct SummaryRecord {
    id: String,
    name: String,
    other_user_email: String,
    latest_message: LatestMessageRecord,
}

#[derive(Debug, Deserialize)]
struct LatestMessageRecord {
    date: String,
    message: String,
    is_read: bool,
}

/// Flat record for one participant's summary entry.
pub fn encode_summary(summary: &ConversationSummary) -> Value {
    json!({
        "id": summary.id.as_str(),
        "name": summary.counterpart_name,
        "other_user_email": summary.counterpart_key.as_str(),
        "latest_message": encode_latest_message(&summary.latest_message),
    })
}

/// Flat record for the `latest_message` field alone, used when an
/// existing summary entry is updated in place.
pub fn encode_latest_message(latest: &LatestMessage) -> Value {
    json!({
        "date": latest.date.to_rfc3339(),
        "message": latest.text,
        "is_read": latest.is_read,
    })
}

/// Inverse of [`encode_summary`]; `None` drops the entry.
pub fn decode_summary(value: &Value) -> Option<ConversationSummary> {
    let record: SummaryRecord = serde_json::from_value(value.clone()).ok()?;
    let date = parse_date(&record.latest_message.date)?;

    Some(ConversationSummary {
        id: ConversationId::from_raw(record.id),
        counterpart_key: UserKey::from_raw(record.other_user_email),
        counterpart_name: record.name,
        latest_message: LatestMessage {
            date,
            text: record.latest_message.message,
            is_read: record.latest_message.is_read,
        },
    })
}

/// Decode a stored summary list, dropping undecodable entries.
pub fn decode_summaries(value: &Value) -> Vec<ConversationSummary> {
    let Some(entries) = value.as_array() else {
        return Vec::new();
    };
    entries
        .iter()
        .filter_map(|entry| {
            let summary = decode_summary(entry);
            if summary.is_none() {
                debug!(?entry, "dropping undecodable conversation summary");
            }
            summary
        })
        .collect()
}

fn parse_date(raw: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .ok()
        .map(|date| date.with_timezone(&Utc))
}
