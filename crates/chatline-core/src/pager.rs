use chatline_db::{Query, Result, Row, Store};
use tracing::debug;

/// Issue `query` repeatedly, following continuation cursors, until a page
/// comes back without one. Returns every row in page order.
///
/// The walk always starts from the beginning: any cursor already on `query`
/// is cleared. The first store error ends the walk and the rows gathered so
/// far are dropped.
pub async fn walk(store: &dyn Store, mut query: Query) -> Result<Vec<Row>> {
    query.start = None;

    let mut rows = Vec::new();
    let mut pages = 0usize;
    loop {
        let page = store.query(&query).await?;
        pages += 1;
        rows.extend(page.items);

        match page.next_cursor {
            Some(cursor) => query.start = Some(cursor),
            None => break,
        }
    }

    debug!(
        "Walked {} [{}={}]: {} rows in {} pages",
        query.table, query.key.attribute, query.key.value, rows.len(), pages
    );
    Ok(rows)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chatline_db::models::{AttributeValue, RowExt, row};
    use chatline_db::{KeySchema, MemoryStore, StoreError, TableSchema};

    fn store(page_size: usize) -> MemoryStore {
        MemoryStore::new([TableSchema::new("t", KeySchema::new("P", "S"))], page_size)
    }

    async fn fill(store: &MemoryStore, n: i64) {
        for i in 0..n {
            let mut r = row([("P", "p")]);
            r.insert("S".into(), AttributeValue::N(i));
            store.put_item("t", r).await.unwrap();
        }
    }

    #[tokio::test]
    async fn union_of_pages_for_any_page_size() {
        for page_size in [1, 2, 3, 7, 10, 11, 100] {
            let store = store(page_size);
            fill(&store, 10).await;

            let rows = walk(&store, Query::new("t", "P", "p")).await.unwrap();
            let sorts: Vec<_> = rows.iter().map(|r| r.get_number("S").unwrap()).collect();
            assert_eq!(sorts, (0..10).collect::<Vec<_>>(), "page size {}", page_size);

            let rows = walk(&store, Query::new("t", "P", "p").descending()).await.unwrap();
            let sorts: Vec<_> = rows.iter().map(|r| r.get_number("S").unwrap()).collect();
            assert_eq!(sorts, (0..10).rev().collect::<Vec<_>>(), "page size {}", page_size);
        }
    }

    #[tokio::test]
    async fn empty_partition_is_empty_not_error() {
        let store = store(5);
        let rows = walk(&store, Query::new("t", "P", "nobody")).await.unwrap();
        assert!(rows.is_empty());
    }

    #[tokio::test]
    async fn stale_cursor_is_ignored_on_fresh_walk() {
        let store = store(2);
        fill(&store, 5).await;
        let first = store.query(&Query::new("t", "P", "p")).await.unwrap();

        let query = Query::new("t", "P", "p").start_after(first.next_cursor);
        assert_eq!(walk(&store, query).await.unwrap().len(), 5);
    }

    #[tokio::test]
    async fn store_error_propagates() {
        let store = store(5);
        let err = walk(&store, Query::new("missing", "P", "p")).await.unwrap_err();
        assert!(matches!(err, StoreError::UnknownTable(t) if t == "missing"));
    }
}
