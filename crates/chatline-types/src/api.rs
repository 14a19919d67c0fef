use serde::{Deserialize, Serialize};

// -- Identity token --

/// Bearer-token claims. `sub` is the caller's username, which is the only
/// identity the read path understands.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    pub exp: usize,
}

// -- Conversations --

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CreateConversationRequest {
    /// Other participants; the caller is always added.
    pub users: Vec<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct CreateConversationResponse {
    pub id: String,
}

// -- Errors --

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}
