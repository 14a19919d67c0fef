use axum::{Router, middleware, routing::get};

use crate::auth::AppState;
use crate::conversations;
use crate::middleware::require_auth;

/// All conversation routes, behind bearer-token auth. Unmatched paths fall
/// through to axum's 404.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route(
            "/conversations",
            get(conversations::list_conversations).post(conversations::create_conversation),
        )
        .route(
            "/conversations/{conversation_id}",
            get(conversations::get_conversation).post(conversations::post_message),
        )
        .route_layer(middleware::from_fn_with_state(state.clone(), require_auth))
        .with_state(state)
}
