use std::collections::HashSet;
use std::sync::Arc;

use chatline_db::{MAX_BATCH_ITEMS, Result, Row, Store};
use chatline_types::models::{ConversationDetail, ConversationSummary, Message, ParticipantRow};
use futures_util::future::try_join_all;
use tracing::{debug, info};
use uuid::Uuid;

use crate::fanout::FanOutAggregator;
use crate::readers::Readers;
use crate::records::{message_to_row, participant_to_row};
use crate::tables::Tables;

/// Entry points used by the HTTP layer. Each call is independent; nothing
/// is shared between requests beyond the store handle.
#[derive(Clone)]
pub struct ChatService {
    readers: Readers,
    fanout: FanOutAggregator,
}

impl ChatService {
    pub fn new(store: Arc<dyn Store>, tables: Tables) -> Self {
        let readers = Readers::new(store, tables);
        Self {
            fanout: FanOutAggregator::new(readers.clone()),
            readers,
        }
    }

    pub fn readers(&self) -> &Readers {
        &self.readers
    }

    /// Every conversation `username` takes part in, with participants and
    /// last activity. An unknown user simply has no conversations.
    pub async fn list_conversations(&self, username: &str) -> Result<Vec<ConversationSummary>> {
        let ids = self.readers.conversation_ids(username).await?;
        debug!("{} belongs to {} conversations", username, ids.len());
        self.fanout.aggregate(ids).await
    }

    /// Full thread and participant set of one conversation, fetched
    /// concurrently. `last` is the timestamp of the final message.
    pub async fn get_conversation(&self, conversation_id: &str) -> Result<ConversationDetail> {
        let (messages, participants) = tokio::try_join!(
            self.readers.message_thread(conversation_id),
            self.readers.participants(conversation_id),
        )?;

        Ok(ConversationDetail::new(
            conversation_id.to_string(),
            participants,
            messages,
        ))
    }

    /// Append one message stamped with the current wall-clock time.
    pub async fn post_message(
        &self,
        conversation_id: &str,
        sender: &str,
        body: &str,
    ) -> Result<Message> {
        let message = Message {
            sender: sender.to_string(),
            time: chrono::Utc::now().timestamp_millis(),
            message: body.to_string(),
        };

        self.readers
            .store()
            .put_item(
                &self.readers.tables().messages,
                message_to_row(conversation_id, &message),
            )
            .await?;
        Ok(message)
    }

    /// Create a conversation between `creator` and `users` under a fresh
    /// identifier. Writes one participant row per distinct user.
    pub async fn create_conversation(&self, creator: &str, users: Vec<String>) -> Result<String> {
        let id = Uuid::new_v4().to_string();

        let mut seen = HashSet::new();
        let rows: Vec<Row> = users
            .into_iter()
            .chain(std::iter::once(creator.to_string()))
            .filter(|user| seen.insert(user.clone()))
            .map(|username| {
                participant_to_row(&ParticipantRow {
                    conversation_id: id.clone(),
                    username,
                })
            })
            .collect();

        let table = &self.readers.tables().conversations;
        let store = self.readers.store();
        try_join_all(
            rows.chunks(MAX_BATCH_ITEMS)
                .map(|chunk| store.batch_put_items(table, chunk.to_vec())),
        )
        .await?;

        info!("Created conversation {} with {} participants", id, rows.len());
        Ok(id)
    }
}
