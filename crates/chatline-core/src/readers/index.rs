use std::collections::HashSet;

use chatline_db::{Query, Result};

use super::Readers;
use crate::pager;
use crate::records::participant_from_row;
use crate::tables::{CONVERSATION_ID, USERNAME};

impl Readers {
    /// Identifiers of every conversation `username` belongs to, looked up
    /// through the user index. Order carries no meaning.
    pub async fn conversation_ids(&self, username: &str) -> Result<Vec<String>> {
        let query = Query::new(&self.tables.conversations, USERNAME, username)
            .index(&self.tables.user_index)
            .project([CONVERSATION_ID, USERNAME]);

        let rows = pager::walk(self.store.as_ref(), query).await?;

        let mut seen = HashSet::with_capacity(rows.len());
        let mut ids = Vec::with_capacity(rows.len());
        for row in &rows {
            let participant = participant_from_row(row)?;
            if seen.insert(participant.conversation_id.clone()) {
                ids.push(participant.conversation_id);
            }
        }
        Ok(ids)
    }
}
