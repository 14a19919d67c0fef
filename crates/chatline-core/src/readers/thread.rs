use chatline_db::{Query, Result};
use chatline_types::models::Message;

use super::Readers;
use crate::pager;
use crate::records::message_from_row;
use crate::tables::{CONVERSATION_ID, MESSAGE, SENDER, TIMESTAMP};

impl Readers {
    /// Every message of a conversation, oldest first.
    ///
    /// Messages sharing a timestamp keep the store's insertion order, which
    /// the cursor carries across page boundaries.
    pub async fn message_thread(&self, conversation_id: &str) -> Result<Vec<Message>> {
        let query = Query::new(&self.tables.messages, CONVERSATION_ID, conversation_id)
            .project([TIMESTAMP, SENDER, MESSAGE]);

        pager::walk(self.store.as_ref(), query)
            .await?
            .iter()
            .map(message_from_row)
            .collect()
    }
}
