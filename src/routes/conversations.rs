use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::{Extension, Json};
use serde::Deserialize;

use crate::error::{AppError, AppResult};
use crate::middleware::auth::AuthUser;
use crate::models::conversation::{Conversation, ConversationPreview};
use crate::services::conversation_service::ConversationService;
use crate::services::user_service::UserService;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct CreateConversationRequest {
    pub other_user_id: i64,
}

/// `POST /v1/messages/conversations` — get-or-create the conversation
/// between the caller and another user.
pub async fn create_conversation(
    State(state): State<AppState>,
    Extension(AuthUser(user_id)): Extension<AuthUser>,
    Json(body): Json<CreateConversationRequest>,
) -> AppResult<(StatusCode, Json<Conversation>)> {
    // The counterpart must exist before a channel to them is created.
    let other = UserService::get_by_id(&state.db, body.other_user_id).await?;
    let conversation = ConversationService::get_or_create(&state.db, user_id, other.id).await?;
    Ok((StatusCode::CREATED, Json(conversation)))
}

/// `GET /v1/messages/conversations` — the caller's conversation list.
pub async fn list_conversations(
    State(state): State<AppState>,
    Extension(AuthUser(user_id)): Extension<AuthUser>,
) -> AppResult<Json<Vec<ConversationPreview>>> {
    let conversations = ConversationService::list_for_user(&state.db, user_id).await?;
    Ok(Json(conversations))
}

/// `GET /v1/messages/conversations/{id}` — one conversation, participants
/// included. Callers outside the conversation are refused.
pub async fn get_conversation(
    State(state): State<AppState>,
    Extension(AuthUser(user_id)): Extension<AuthUser>,
    Path(conversation_id): Path<i64>,
) -> AppResult<Json<Conversation>> {
    let conversation = ConversationService::get(&state.db, conversation_id).await?;
    if !conversation.has_participant(user_id) {
        return Err(AppError::Forbidden("not a participant".into()));
    }
    Ok(Json(conversation))
}
