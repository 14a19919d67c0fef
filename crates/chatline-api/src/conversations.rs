use axum::{
    Extension, Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};

use chatline_types::api::{Claims, CreateConversationRequest, CreateConversationResponse};
use chatline_types::models::{ConversationDetail, ConversationSummary};

use crate::auth::AppState;
use crate::error::ApiError;

pub async fn list_conversations(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<Json<Vec<ConversationSummary>>, ApiError> {
    let conversations = state.service.list_conversations(&claims.sub).await?;
    Ok(Json(conversations))
}

pub async fn create_conversation(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Json(req): Json<CreateConversationRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let id = state.service.create_conversation(&claims.sub, req.users).await?;
    Ok((StatusCode::CREATED, Json(CreateConversationResponse { id })))
}

/// Participants and the full thread. Access is not checked against
/// membership; any authenticated caller may read any conversation.
pub async fn get_conversation(
    State(state): State<AppState>,
    Path(conversation_id): Path<String>,
) -> Result<Json<ConversationDetail>, ApiError> {
    let detail = state.service.get_conversation(&conversation_id).await?;
    Ok(Json(detail))
}

/// The request body is the raw message text.
pub async fn post_message(
    State(state): State<AppState>,
    Path(conversation_id): Path<String>,
    Extension(claims): Extension<Claims>,
    body: String,
) -> Result<impl IntoResponse, ApiError> {
    if body.is_empty() {
        return Err(ApiError::BadRequest("message body is empty".into()));
    }

    let message = state
        .service
        .post_message(&conversation_id, &claims.sub, &body)
        .await?;
    Ok((StatusCode::CREATED, Json(message)))
}
