use std::collections::BTreeSet;

use chatline_db::{Query, Result};

use super::Readers;
use crate::pager;
use crate::records::participant_from_row;
use crate::tables::{CONVERSATION_ID, USERNAME};

impl Readers {
    /// Usernames with a ParticipantRow for this conversation.
    pub async fn participants(&self, conversation_id: &str) -> Result<BTreeSet<String>> {
        let query = Query::new(&self.tables.conversations, CONVERSATION_ID, conversation_id)
            .project([CONVERSATION_ID, USERNAME]);

        pager::walk(self.store.as_ref(), query)
            .await?
            .iter()
            .map(|row| participant_from_row(row).map(|p| p.username))
            .collect()
    }
}
