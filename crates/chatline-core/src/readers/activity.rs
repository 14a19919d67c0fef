use chatline_db::{Query, Result, RowExt};

use super::Readers;
use crate::tables::{CONVERSATION_ID, TIMESTAMP};

impl Readers {
    /// Timestamp of the newest message, or `None` for an empty thread.
    /// One newest-first query with a limit of one; never paginates.
    pub async fn last_activity(&self, conversation_id: &str) -> Result<Option<i64>> {
        let query = Query::new(&self.tables.messages, CONVERSATION_ID, conversation_id)
            .descending()
            .limit(1)
            .project([TIMESTAMP]);

        let page = self.store.query(&query).await?;
        page.items.first().map(|row| row.get_number(TIMESTAMP)).transpose()
    }
}
