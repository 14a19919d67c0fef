use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

/// One membership fact: `username` takes part in `conversation_id`.
/// Doubles as the entry of the user -> conversations index.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParticipantRow {
    pub conversation_id: String,
    pub username: String,
}

/// A single message of a conversation thread. Messages are append-only;
/// `time` is wall-clock milliseconds and is not guaranteed unique.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub sender: String,
    pub time: i64,
    pub message: String,
}

/// A conversation as it appears in a user's conversation list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversationSummary {
    pub id: String,
    pub participants: BTreeSet<String>,
    /// Timestamp of the newest message, absent when the thread is empty.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last: Option<i64>,
}

/// A conversation with its full thread, oldest message first.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversationDetail {
    pub id: String,
    pub participants: BTreeSet<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last: Option<i64>,
    pub messages: Vec<Message>,
}

impl ConversationDetail {
    /// Assemble a detail record, deriving `last` from the final message.
    pub fn new(id: String, participants: BTreeSet<String>, messages: Vec<Message>) -> Self {
        let last = messages.last().map(|m| m.time);
        Self {
            id,
            participants,
            last,
            messages,
        }
    }
}
