use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD as B64;
use serde::{Deserialize, Serialize};

use crate::error::{Result, StoreError};
use crate::models::AttributeValue;

/// Opaque continuation token handed back with a non-final page.
///
/// Internally it names the last row returned by its sort value and insertion
/// sequence, so rows sharing a sort value still resume at the right place.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Cursor(String);

#[derive(Serialize, Deserialize)]
struct Position {
    sort: AttributeValue,
    seq: i64,
}

impl Cursor {
    pub(crate) fn encode(sort: &AttributeValue, seq: i64) -> Result<Self> {
        let json = serde_json::to_vec(&Position {
            sort: sort.clone(),
            seq,
        })?;
        Ok(Self(B64.encode(json)))
    }

    pub(crate) fn decode(&self) -> Result<(AttributeValue, i64)> {
        let bytes = B64.decode(&self.0).map_err(|_| StoreError::InvalidCursor)?;
        let pos: Position = serde_json::from_slice(&bytes).map_err(|_| StoreError::InvalidCursor)?;
        Ok((pos.sort, pos.seq))
    }

    /// Wrap a token received from outside (e.g. a client echoing it back).
    pub fn from_token(token: impl Into<String>) -> Self {
        Self(token.into())
    }
}
