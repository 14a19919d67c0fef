use async_trait::async_trait;
use rusqlite::Connection;
use tracing::debug;

use crate::cursor::Cursor;
use crate::error::{Result, StoreError};
use crate::models::{AttributeValue, Row};
use crate::query::{Page, Query, apply_projection};
use crate::store::{MAX_BATCH_ITEMS, Store};
use crate::Database;

impl Database {
    // -- Writes --

    /// Append rows to `table` in one transaction. Every row is validated
    /// before anything is written.
    pub fn insert_rows(&self, table: &str, rows: &[Row]) -> Result<()> {
        for row in rows {
            self.schemas().validate_row(table, row)?;
        }

        self.with_conn_mut(|conn| {
            let tx = conn.transaction()?;
            {
                let mut stmt = tx.prepare_cached("INSERT INTO items (table_name, attrs) VALUES (?1, ?2)")?;
                for row in rows {
                    stmt.execute((table, serde_json::to_string(row)?))?;
                }
            }
            tx.commit()?;
            Ok(())
        })
    }

    // -- Reads --

    pub fn select_page(&self, query: &Query) -> Result<Page> {
        let key = self.schemas().key_for(&query.table, query.index.as_deref())?;
        let start = query.start.as_ref().map(Cursor::decode).transpose()?;
        let page_len = query.page_len(self.page_size());

        let mut rows = self.with_conn(|conn| {
            query_rows(conn, query, &key.sort, start.as_ref(), page_len + 1)
        })?;

        let next_cursor = if rows.len() > page_len {
            rows.truncate(page_len);
            match rows.last() {
                Some((seq, sort, _)) => Some(Cursor::encode(sort, *seq)?),
                None => None,
            }
        } else {
            None
        };

        debug!(
            "Query {} [{}={}] returned {} rows (more: {})",
            query.table,
            query.key.attribute,
            query.key.value,
            rows.len(),
            next_cursor.is_some()
        );

        let items = rows
            .into_iter()
            .map(|(_, _, row)| apply_projection(row, query.projection.as_deref()))
            .collect();

        Ok(Page { items, next_cursor })
    }
}

/// `json_extract` of one attribute, with the path inlined as a literal so
/// the expression matches the key indexes built in `migrations`.
pub(crate) fn attr_expr(attribute: &str) -> String {
    let path = format!("$.\"{}\"", attribute.replace('"', "\\\""));
    format!("json_extract(attrs, '{}')", path.replace('\'', "''"))
}

fn page_sql(query: &Query, sort_attribute: &str) -> String {
    let (cmp, dir) = if query.descending { ("<", "DESC") } else { (">", "ASC") };
    let key = attr_expr(&query.key.attribute);
    let sort = attr_expr(sort_attribute);
    format!(
        "SELECT seq, {sort}, attrs
         FROM items
         WHERE table_name = ?1
           AND {key} = ?2
           AND {sort} IS NOT NULL
           AND (?3 IS NULL
                OR {sort} {cmp} ?3
                OR ({sort} = ?3 AND seq {cmp} ?4))
         ORDER BY {sort} {dir}, seq {dir}
         LIMIT ?5"
    )
}

fn query_rows(
    conn: &Connection,
    query: &Query,
    sort_attribute: &str,
    start: Option<&(AttributeValue, i64)>,
    limit: usize,
) -> Result<Vec<(i64, AttributeValue, Row)>> {
    let sql = page_sql(query, sort_attribute);
    let mut stmt = conn.prepare_cached(&sql)?;
    let raw = stmt
        .query_map(
            rusqlite::params![
                query.table,
                query.key.value,
                start.map(|(sort, _)| sort),
                start.map(|(_, seq)| *seq),
                limit as i64,
            ],
            |row| {
                Ok((
                    row.get::<_, i64>(0)?,
                    row.get::<_, AttributeValue>(1)?,
                    row.get::<_, String>(2)?,
                ))
            },
        )?
        .collect::<std::result::Result<Vec<_>, _>>()?;

    raw.into_iter()
        .map(|(seq, sort, attrs)| -> Result<_> {
            Ok((seq, sort, serde_json::from_str::<Row>(&attrs)?))
        })
        .collect()
}

#[async_trait]
impl Store for Database {
    async fn query(&self, query: &Query) -> Result<Page> {
        // Run blocking SQLite work off the async runtime
        let db = self.clone();
        let query = query.clone();
        tokio::task::spawn_blocking(move || db.select_page(&query))
            .await
            .map_err(|e| StoreError::Task(e.to_string()))?
    }

    async fn put_item(&self, table: &str, row: Row) -> Result<()> {
        let db = self.clone();
        let table = table.to_string();
        tokio::task::spawn_blocking(move || db.insert_rows(&table, &[row]))
            .await
            .map_err(|e| StoreError::Task(e.to_string()))?
    }

    async fn batch_put_items(&self, table: &str, rows: Vec<Row>) -> Result<()> {
        if rows.len() > MAX_BATCH_ITEMS {
            return Err(StoreError::BatchTooLarge(rows.len()));
        }
        let db = self.clone();
        let table = table.to_string();
        tokio::task::spawn_blocking(move || db.insert_rows(&table, &rows))
            .await
            .map_err(|e| StoreError::Task(e.to_string()))?
    }
}
