use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::{Extension, Json};
use serde::Deserialize;
use serde_json::json;

use crate::error::{AppError, AppResult};
use crate::middleware::auth::AuthUser;
use crate::models::message::Message;
use crate::services::conversation_service::ConversationService;
use crate::services::message_service::MessageService;
use crate::state::AppState;
use crate::websocket::handler::broadcast_message;

#[derive(Debug, Deserialize)]
pub struct SendMessageRequest {
    pub content: String,
}

#[derive(Debug, Deserialize, Default)]
pub struct Pagination {
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

/// `POST /v1/messages/conversations/{id}/messages` — persist a message and
/// fan it out to live subscribers. Same persist-then-broadcast contract as
/// the websocket path.
pub async fn send_message(
    State(state): State<AppState>,
    Extension(AuthUser(user_id)): Extension<AuthUser>,
    Path(conversation_id): Path<i64>,
    Json(body): Json<SendMessageRequest>,
) -> AppResult<(StatusCode, Json<Message>)> {
    let message = MessageService::create(&state.db, conversation_id, user_id, &body.content).await?;
    broadcast_message(&state, message.clone()).await;
    Ok((StatusCode::CREATED, Json(message)))
}

/// `GET /v1/messages/{id}?limit&offset` — paginated messages, newest first.
pub async fn list_messages(
    State(state): State<AppState>,
    Extension(AuthUser(user_id)): Extension<AuthUser>,
    Path(conversation_id): Path<i64>,
    Query(page): Query<Pagination>,
) -> AppResult<Json<Vec<Message>>> {
    if !ConversationService::is_member(&state.db, conversation_id, user_id).await? {
        return Err(AppError::Forbidden("not a participant".into()));
    }
    let messages = MessageService::list(
        &state.db,
        conversation_id,
        page.limit.unwrap_or(50),
        page.offset.unwrap_or(0),
    )
    .await?;
    Ok(Json(messages))
}

/// `PUT /v1/messages/{id}/read` — mark the counterpart's messages read.
pub async fn mark_conversation_read(
    State(state): State<AppState>,
    Extension(AuthUser(user_id)): Extension<AuthUser>,
    Path(conversation_id): Path<i64>,
) -> AppResult<StatusCode> {
    if !ConversationService::is_member(&state.db, conversation_id, user_id).await? {
        return Err(AppError::Forbidden("not a participant".into()));
    }
    MessageService::mark_conversation_read(&state.db, conversation_id, user_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// `GET /v1/messages/unread` — total unread count for the caller.
pub async fn unread_count(
    State(state): State<AppState>,
    Extension(AuthUser(user_id)): Extension<AuthUser>,
) -> AppResult<Json<serde_json::Value>> {
    let count = MessageService::unread_count(&state.db, user_id).await?;
    Ok(Json(json!({ "count": count })))
}
