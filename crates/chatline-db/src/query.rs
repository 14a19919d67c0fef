use crate::cursor::Cursor;
use crate::models::{AttributeValue, Row};

/// Equality condition on the partition attribute of the walked key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyCondition {
    pub attribute: String,
    pub value: AttributeValue,
}

/// One request against a table or one of its secondary indexes.
#[derive(Debug, Clone)]
pub struct Query {
    pub table: String,
    pub index: Option<String>,
    pub key: KeyCondition,
    /// Attributes to return; `None` returns whole rows.
    pub projection: Option<Vec<String>>,
    pub descending: bool,
    pub limit: Option<usize>,
    /// Resume strictly after this position.
    pub start: Option<Cursor>,
}

impl Query {
    pub fn new(
        table: impl Into<String>,
        attribute: impl Into<String>,
        value: impl Into<AttributeValue>,
    ) -> Self {
        Self {
            table: table.into(),
            index: None,
            key: KeyCondition {
                attribute: attribute.into(),
                value: value.into(),
            },
            projection: None,
            descending: false,
            limit: None,
            start: None,
        }
    }

    pub fn index(mut self, name: impl Into<String>) -> Self {
        self.index = Some(name.into());
        self
    }

    pub fn project<I, S>(mut self, attributes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.projection = Some(attributes.into_iter().map(Into::into).collect());
        self
    }

    pub fn descending(mut self) -> Self {
        self.descending = true;
        self
    }

    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn start_after(mut self, cursor: Option<Cursor>) -> Self {
        self.start = cursor;
        self
    }

    /// Rows this call may return given the store's own page cap.
    pub(crate) fn page_len(&self, page_size: usize) -> usize {
        self.limit.map_or(page_size, |l| l.min(page_size)).max(1)
    }
}

/// One bounded chunk of results. A missing `next_cursor` marks the final page.
#[derive(Debug, Clone, Default)]
pub struct Page {
    pub items: Vec<Row>,
    pub next_cursor: Option<Cursor>,
}

/// Keep only the projected attributes of a row.
pub(crate) fn apply_projection(row: Row, projection: Option<&[String]>) -> Row {
    match projection {
        None => row,
        Some(attrs) => row
            .into_iter()
            .filter(|(name, _)| attrs.iter().any(|a| a == name))
            .collect(),
    }
}

/// True when `(sort, seq)` lies strictly after the cursor position in the
/// walk direction.
pub(crate) fn is_after(
    sort: &AttributeValue,
    seq: i64,
    cursor: &(AttributeValue, i64),
    descending: bool,
) -> bool {
    let ord = (sort, seq).cmp(&(&cursor.0, cursor.1));
    if descending { ord.is_lt() } else { ord.is_gt() }
}
