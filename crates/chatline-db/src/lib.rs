pub mod cursor;
pub mod error;
pub mod memory;
pub mod migrations;
pub mod models;
pub mod queries;
pub mod query;
pub mod store;

pub use cursor::Cursor;
pub use error::{Result, StoreError};
pub use memory::MemoryStore;
pub use models::{AttributeValue, KeySchema, Row, RowExt, Schemas, TableSchema};
pub use query::{KeyCondition, Page, Query};
pub use store::{DEFAULT_PAGE_SIZE, MAX_BATCH_ITEMS, Store};

use rusqlite::Connection;
use std::path::Path;
use std::sync::Arc;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use tracing::info;

const READER_POOL_SIZE: usize = 4;

/// SQLite-backed store with a reader/writer split. Cheap to clone; clones
/// share the same connections.
#[derive(Clone)]
pub struct Database {
    inner: Arc<DatabaseInner>,
}

struct DatabaseInner {
    writer: Mutex<Connection>,
    /// Empty for in-memory databases, which fall back to the writer.
    readers: Vec<Mutex<Connection>>,
    reader_idx: AtomicUsize,
    schemas: Schemas,
    page_size: usize,
}

impl Database {
    pub fn open(
        path: &Path,
        tables: impl IntoIterator<Item = TableSchema>,
        page_size: usize,
    ) -> Result<Self> {
        let writer = Connection::open(path)?;

        // WAL mode for concurrent reads
        writer.pragma_update(None, "journal_mode", "WAL")?;

        let schemas = Schemas::new(tables);
        migrations::run(&writer)?;
        migrations::ensure_key_indexes(&writer, &schemas)?;

        let mut readers = Vec::with_capacity(READER_POOL_SIZE);
        for _ in 0..READER_POOL_SIZE {
            let conn = Connection::open_with_flags(
                path,
                rusqlite::OpenFlags::SQLITE_OPEN_READ_ONLY
                    | rusqlite::OpenFlags::SQLITE_OPEN_NO_MUTEX,
            )?;
            readers.push(Mutex::new(conn));
        }

        info!(
            "Database opened at {} (1 writer + {} readers)",
            path.display(),
            READER_POOL_SIZE
        );
        Ok(Self::from_parts(writer, readers, schemas, page_size))
    }

    pub fn open_in_memory(
        tables: impl IntoIterator<Item = TableSchema>,
        page_size: usize,
    ) -> Result<Self> {
        let writer = Connection::open_in_memory()?;
        let schemas = Schemas::new(tables);
        migrations::run(&writer)?;
        migrations::ensure_key_indexes(&writer, &schemas)?;
        Ok(Self::from_parts(writer, Vec::new(), schemas, page_size))
    }

    fn from_parts(
        writer: Connection,
        readers: Vec<Mutex<Connection>>,
        schemas: Schemas,
        page_size: usize,
    ) -> Self {
        Self {
            inner: Arc::new(DatabaseInner {
                writer: Mutex::new(writer),
                readers,
                reader_idx: AtomicUsize::new(0),
                schemas,
                page_size: page_size.max(1),
            }),
        }
    }

    pub fn schemas(&self) -> &Schemas {
        &self.inner.schemas
    }

    pub fn page_size(&self) -> usize {
        self.inner.page_size
    }

    pub fn with_conn<F, T>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&Connection) -> Result<T>,
    {
        if self.inner.readers.is_empty() {
            return self.with_conn_mut(|conn| f(&*conn));
        }
        let idx = self.inner.reader_idx.fetch_add(1, Ordering::Relaxed) % self.inner.readers.len();
        let conn = self.inner.readers[idx]
            .lock()
            .map_err(|e| StoreError::Unavailable(format!("reader lock poisoned: {}", e)))?;
        f(&conn)
    }

    pub fn with_conn_mut<F, T>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&mut Connection) -> Result<T>,
    {
        let mut conn = self
            .inner
            .writer
            .lock()
            .map_err(|e| StoreError::Unavailable(format!("writer lock poisoned: {}", e)))?;
        f(&mut conn)
    }
}
