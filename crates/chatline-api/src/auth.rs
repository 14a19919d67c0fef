use std::sync::Arc;

use anyhow::Context;
use jsonwebtoken::{EncodingKey, Header, encode};

use chatline_core::ChatService;
use chatline_types::api::Claims;

pub type AppState = Arc<AppStateInner>;

pub struct AppStateInner {
    pub service: ChatService,
    pub jwt_secret: String,
}

/// Mint a bearer token for `username`, valid for `ttl`.
pub fn create_token(secret: &str, username: &str, ttl: chrono::Duration) -> anyhow::Result<String> {
    let exp = (chrono::Utc::now() + ttl).timestamp();
    let claims = Claims {
        sub: username.to_string(),
        exp: usize::try_from(exp).context("token would expire before 1970")?,
    };

    let token = encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )?;

    Ok(token)
}
