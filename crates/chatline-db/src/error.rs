use thiserror::Error;

/// Any failure reported by a store call. Core operations return this
/// unchanged so the caller sees whatever detail the store attached.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("sqlite: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("unknown table '{0}'")]
    UnknownTable(String),

    #[error("unknown index '{index}' on table '{table}'")]
    UnknownIndex { table: String, index: String },

    #[error("row for table '{table}' is missing key attribute '{attribute}'")]
    MissingKey { table: String, attribute: String },

    #[error("batch of {0} items exceeds the limit of {max}", max = crate::MAX_BATCH_ITEMS)]
    BatchTooLarge(usize),

    #[error("invalid continuation cursor")]
    InvalidCursor,

    #[error("malformed row: attribute '{attribute}' {reason}")]
    MalformedRow { attribute: String, reason: String },

    #[error("serialization: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("store task failed: {0}")]
    Task(String),

    #[error("store unavailable: {0}")]
    Unavailable(String),
}

pub type Result<T> = std::result::Result<T, StoreError>;
