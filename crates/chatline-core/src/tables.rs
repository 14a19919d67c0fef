use chatline_db::{KeySchema, TableSchema};

// -- Attribute names --

pub const CONVERSATION_ID: &str = "ConversationID";
pub const USERNAME: &str = "Username";
pub const TIMESTAMP: &str = "Timestamp";
pub const SENDER: &str = "Sender";
pub const MESSAGE: &str = "Message";

/// Names of the two tables and the user -> conversations index.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tables {
    /// One ParticipantRow per (conversation, user).
    pub conversations: String,
    /// One row per message, sorted by timestamp within a conversation.
    pub messages: String,
    /// Secondary index on `conversations` keyed by username.
    pub user_index: String,
}

impl Default for Tables {
    fn default() -> Self {
        Self {
            conversations: "Chat-Conversations".into(),
            messages: "Chat-Messages".into(),
            user_index: "Username-ConversationID-index".into(),
        }
    }
}

impl Tables {
    /// Schemas a store must be opened with to serve these tables.
    pub fn schemas(&self) -> Vec<TableSchema> {
        vec![
            TableSchema::new(&self.conversations, KeySchema::new(CONVERSATION_ID, USERNAME))
                .with_index(&self.user_index, KeySchema::new(USERNAME, CONVERSATION_ID)),
            TableSchema::new(&self.messages, KeySchema::new(CONVERSATION_ID, TIMESTAMP)),
        ]
    }
}
