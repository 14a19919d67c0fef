use std::collections::HashMap;
use std::sync::RwLock;

use async_trait::async_trait;
use tracing::info;

use crate::cursor::Cursor;
use crate::error::{Result, StoreError};
use crate::models::{Row, Schemas, TableSchema};
use crate::query::{Page, Query, apply_projection, is_after};
use crate::store::{MAX_BATCH_ITEMS, Store};

/// In-process store with the same ordering and paging rules as `Database`.
/// Handy for tests and for running the server without a database file.
pub struct MemoryStore {
    schemas: Schemas,
    page_size: usize,
    inner: RwLock<MemoryInner>,
}

#[derive(Default)]
struct MemoryInner {
    next_seq: i64,
    /// table name -> (insertion sequence, row)
    tables: HashMap<String, Vec<(i64, Row)>>,
}

impl MemoryStore {
    pub fn new(tables: impl IntoIterator<Item = TableSchema>, page_size: usize) -> Self {
        let schemas = Schemas::new(tables);
        info!("Memory store ready (page size {})", page_size);
        Self {
            schemas,
            page_size: page_size.max(1),
            inner: RwLock::new(MemoryInner::default()),
        }
    }

    fn append(&self, table: &str, rows: Vec<Row>) -> Result<()> {
        for row in &rows {
            self.schemas.validate_row(table, row)?;
        }

        let mut inner = self
            .inner
            .write()
            .map_err(|e| StoreError::Unavailable(format!("memory store lock poisoned: {}", e)))?;
        for row in rows {
            inner.next_seq += 1;
            let seq = inner.next_seq;
            inner.tables.entry(table.to_string()).or_default().push((seq, row));
        }
        Ok(())
    }

    fn select(&self, query: &Query) -> Result<Page> {
        let key = self.schemas.key_for(&query.table, query.index.as_deref())?;
        let start = query.start.as_ref().map(Cursor::decode).transpose()?;

        let inner = self
            .inner
            .read()
            .map_err(|e| StoreError::Unavailable(format!("memory store lock poisoned: {}", e)))?;

        let mut matching: Vec<_> = inner
            .tables
            .get(&query.table)
            .into_iter()
            .flatten()
            .filter(|(_, row)| row.get(&query.key.attribute) == Some(&query.key.value))
            .filter_map(|(seq, row)| row.get(&key.sort).map(|sort| (sort.clone(), *seq, row)))
            .collect();

        matching.sort_by(|a, b| (&a.0, a.1).cmp(&(&b.0, b.1)));
        if query.descending {
            matching.reverse();
        }

        let page_len = query.page_len(self.page_size);
        let mut remaining = matching
            .into_iter()
            .filter(|(sort, seq, _)| {
                start
                    .as_ref()
                    .is_none_or(|pos| is_after(sort, *seq, pos, query.descending))
            })
            .take(page_len + 1);

        let mut items = Vec::with_capacity(page_len);
        let mut last = None;
        for (sort, seq, row) in remaining.by_ref().take(page_len) {
            items.push(apply_projection(row.clone(), query.projection.as_deref()));
            last = Some((sort, seq));
        }

        let next_cursor = match (remaining.next(), last) {
            (Some(_), Some((sort, seq))) => Some(Cursor::encode(&sort, seq)?),
            _ => None,
        };

        Ok(Page { items, next_cursor })
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn query(&self, query: &Query) -> Result<Page> {
        self.select(query)
    }

    async fn put_item(&self, table: &str, row: Row) -> Result<()> {
        self.append(table, vec![row])
    }

    async fn batch_put_items(&self, table: &str, rows: Vec<Row>) -> Result<()> {
        if rows.len() > MAX_BATCH_ITEMS {
            return Err(StoreError::BatchTooLarge(rows.len()));
        }
        self.append(table, rows)
    }
}
