//! Store-level value and schema types. These describe wide-column rows and
//! are distinct from chatline-types records to keep the store independent.

use std::collections::{BTreeMap, HashMap};
use std::fmt;

use rusqlite::types::{FromSql, FromSqlError, FromSqlResult, ToSql, ToSqlOutput, ValueRef};
use serde::{Deserialize, Serialize};

use crate::error::{Result, StoreError};

/// A single attribute value. Serialises as a bare JSON string or number so
/// that SQLite's `json_extract` yields TEXT or INTEGER respectively.
///
/// Variant order matters: numbers sort before strings, as SQLite orders
/// INTEGER before TEXT.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AttributeValue {
    N(i64),
    S(String),
}

impl fmt::Display for AttributeValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::S(s) => write!(f, "{}", s),
            Self::N(n) => write!(f, "{}", n),
        }
    }
}

impl From<&str> for AttributeValue {
    fn from(s: &str) -> Self {
        Self::S(s.to_string())
    }
}

impl From<String> for AttributeValue {
    fn from(s: String) -> Self {
        Self::S(s)
    }
}

impl From<i64> for AttributeValue {
    fn from(n: i64) -> Self {
        Self::N(n)
    }
}

impl ToSql for AttributeValue {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        match self {
            Self::S(s) => s.to_sql(),
            Self::N(n) => n.to_sql(),
        }
    }
}

impl FromSql for AttributeValue {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        match value {
            ValueRef::Integer(n) => Ok(Self::N(n)),
            ValueRef::Text(_) => value.as_str().map(|s| Self::S(s.to_string())),
            _ => Err(FromSqlError::InvalidType),
        }
    }
}

/// A stored row: attribute name -> value.
pub type Row = BTreeMap<String, AttributeValue>;

/// Typed accessors for reading rows back out of a page.
pub trait RowExt {
    fn get_str(&self, attribute: &str) -> Result<&str>;
    fn get_number(&self, attribute: &str) -> Result<i64>;
}

impl RowExt for Row {
    fn get_str(&self, attribute: &str) -> Result<&str> {
        match self.get(attribute) {
            Some(AttributeValue::S(s)) => Ok(s),
            Some(AttributeValue::N(_)) => Err(malformed(attribute, "is a number, expected a string")),
            None => Err(malformed(attribute, "is missing")),
        }
    }

    fn get_number(&self, attribute: &str) -> Result<i64> {
        match self.get(attribute) {
            Some(AttributeValue::N(n)) => Ok(*n),
            Some(AttributeValue::S(_)) => Err(malformed(attribute, "is a string, expected a number")),
            None => Err(malformed(attribute, "is missing")),
        }
    }
}

fn malformed(attribute: &str, reason: &str) -> StoreError {
    StoreError::MalformedRow {
        attribute: attribute.to_string(),
        reason: reason.to_string(),
    }
}

/// Partition + sort attribute pair. Queries select one partition and walk
/// it in sort order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeySchema {
    pub partition: String,
    pub sort: String,
}

impl KeySchema {
    pub fn new(partition: impl Into<String>, sort: impl Into<String>) -> Self {
        Self {
            partition: partition.into(),
            sort: sort.into(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct TableSchema {
    pub name: String,
    pub key: KeySchema,
    /// Secondary indexes by name.
    pub indexes: HashMap<String, KeySchema>,
}

impl TableSchema {
    pub fn new(name: impl Into<String>, key: KeySchema) -> Self {
        Self {
            name: name.into(),
            key,
            indexes: HashMap::new(),
        }
    }

    pub fn with_index(mut self, name: impl Into<String>, key: KeySchema) -> Self {
        self.indexes.insert(name.into(), key);
        self
    }
}

/// The set of tables a store was opened with.
#[derive(Debug, Clone, Default)]
pub struct Schemas {
    tables: HashMap<String, TableSchema>,
}

impl Schemas {
    pub fn new(tables: impl IntoIterator<Item = TableSchema>) -> Self {
        Self {
            tables: tables.into_iter().map(|t| (t.name.clone(), t)).collect(),
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = &TableSchema> {
        self.tables.values()
    }

    pub fn table(&self, table: &str) -> Result<&TableSchema> {
        self.tables
            .get(table)
            .ok_or_else(|| StoreError::UnknownTable(table.to_string()))
    }

    /// Key schema a query walks: the table's own key, or the named index's.
    pub fn key_for(&self, table: &str, index: Option<&str>) -> Result<&KeySchema> {
        let schema = self.table(table)?;
        match index {
            None => Ok(&schema.key),
            Some(name) => schema.indexes.get(name).ok_or_else(|| StoreError::UnknownIndex {
                table: table.to_string(),
                index: name.to_string(),
            }),
        }
    }

    /// Every row written must carry the table's primary key attributes.
    pub fn validate_row(&self, table: &str, row: &Row) -> Result<()> {
        let key = &self.table(table)?.key;
        for attribute in [&key.partition, &key.sort] {
            if !row.contains_key(attribute) {
                return Err(StoreError::MissingKey {
                    table: table.to_string(),
                    attribute: attribute.clone(),
                });
            }
        }
        Ok(())
    }
}

/// Build a row from `(attribute, value)` pairs.
pub fn row<K, V>(pairs: impl IntoIterator<Item = (K, V)>) -> Row
where
    K: Into<String>,
    V: Into<AttributeValue>,
{
    pairs.into_iter().map(|(k, v)| (k.into(), v.into())).collect()
}
