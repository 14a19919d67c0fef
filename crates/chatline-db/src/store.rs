use async_trait::async_trait;

use crate::error::Result;
use crate::models::Row;
use crate::query::{Page, Query};

/// Upper bound on rows accepted by a single `batch_put_items` call.
pub const MAX_BATCH_ITEMS: usize = 25;

/// Rows returned per page when a store is not told otherwise.
pub const DEFAULT_PAGE_SIZE: usize = 100;

/// The paginated wide-column store the read path runs against.
///
/// Implementations are shared as `Arc<dyn Store>` and must tolerate many
/// concurrent calls from one request.
#[async_trait]
pub trait Store: Send + Sync {
    /// Return one page of rows matching `query`, in key order.
    async fn query(&self, query: &Query) -> Result<Page>;

    /// Append a single row.
    async fn put_item(&self, table: &str, row: Row) -> Result<()>;

    /// Append up to [`MAX_BATCH_ITEMS`] rows.
    async fn batch_put_items(&self, table: &str, rows: Vec<Row>) -> Result<()>;
}
