use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::{Extension, Json};
use serde::Deserialize;

use crate::error::AppError;
use crate::models::{Notification, NotificationPayload};
use crate::services::auth_service::Principal;
use crate::services::sanitize::sanitize_notification;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct CreateNotificationRequest {
    pub user_id: i64,
    #[serde(flatten)]
    pub payload: NotificationPayload,
}

/// Entry point for the other feature services: persist a typed notification
/// and push it live if the target user is connected.
pub async fn create_notification(
    State(state): State<AppState>,
    Json(body): Json<CreateNotificationRequest>,
) -> Result<(StatusCode, Json<Notification>), AppError> {
    let notification = state.dispatcher.dispatch(body.user_id, body.payload).await?;
    Ok((StatusCode::CREATED, Json(sanitize_notification(notification))))
}

pub async fn unread_notifications(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
) -> Result<Json<Vec<Notification>>, AppError> {
    let notifications = state
        .notifications
        .list_unread_by_user(principal.user_id)
        .await?
        .into_iter()
        .map(sanitize_notification)
        .collect();

    Ok(Json(notifications))
}

pub async fn mark_notification_read(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Path(notification_id): Path<i64>,
) -> Result<StatusCode, AppError> {
    state
        .notifications
        .mark_as_read(notification_id, principal.user_id)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}
