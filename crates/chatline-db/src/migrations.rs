use rusqlite::Connection;
use tracing::info;

use crate::error::Result;
use crate::models::{KeySchema, Schemas};
use crate::queries::attr_expr;

/// Rows of every logical table live in one `items` table as JSON, keyed by
/// an autoincrement `seq` that doubles as the stable tiebreak for equal sort
/// values.
pub fn run(conn: &Connection) -> Result<()> {
    conn.execute_batch("CREATE TABLE IF NOT EXISTS schema_version (version INTEGER NOT NULL);")?;

    let version: i64 = conn.query_row(
        "SELECT COALESCE(MAX(version), 0) FROM schema_version",
        [],
        |r| r.get(0),
    )?;

    if version < 1 {
        info!("Store DB: running migration v1 (items table)");
        conn.execute_batch(
            "
            CREATE TABLE items (
                seq         INTEGER PRIMARY KEY AUTOINCREMENT,
                table_name  TEXT NOT NULL,
                attrs       TEXT NOT NULL
            );

            CREATE INDEX idx_items_table ON items(table_name);

            INSERT INTO schema_version (version) VALUES (1);
            ",
        )?;
    }

    info!("Database migrations complete");
    Ok(())
}

/// One expression index per key schema the store was opened with, so a page
/// query seeks straight to its partition in sort order. Attribute names come
/// from configuration, so these are built at open time rather than in a
/// numbered migration.
pub fn ensure_key_indexes(conn: &Connection, schemas: &Schemas) -> Result<()> {
    for table in schemas.iter() {
        for key in std::iter::once(&table.key).chain(table.indexes.values()) {
            let name = index_name(&table.name, key);
            conn.execute_batch(&format!(
                "CREATE INDEX IF NOT EXISTS \"{}\" ON items(table_name, {}, {}, seq);",
                name,
                attr_expr(&key.partition),
                attr_expr(&key.sort),
            ))?;
        }
    }
    Ok(())
}

fn index_name(table: &str, key: &KeySchema) -> String {
    let raw = format!("idx_key_{}_{}_{}", table, key.partition, key.sort);
    raw.chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '_' { c } else { '_' })
        .collect()
}
