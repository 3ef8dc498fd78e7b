use axum::extract::{Path, State};
use axum::{Extension, Json};

use crate::error::AppError;
use crate::models::{Chat, Message};
use crate::services::auth_service::Principal;
use crate::services::sanitize::sanitize_message;
use crate::state::AppState;

pub async fn list_chats(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
) -> Result<Json<Vec<Chat>>, AppError> {
    let chats = state.chats.list_by_user(principal.user_id).await?;
    Ok(Json(chats))
}

pub async fn messages_list(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Path(chat_id): Path<i64>,
) -> Result<Json<Vec<Message>>, AppError> {
    let chat = state.chats.get(chat_id).await?.ok_or(AppError::NotFound)?;
    if !chat.has_participant(principal.user_id) {
        return Err(AppError::Forbidden);
    }

    let messages = state
        .chats
        .messages_list(chat_id)
        .await?
        .into_iter()
        .map(sanitize_message)
        .collect();

    Ok(Json(messages))
}
