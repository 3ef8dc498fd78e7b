use std::sync::Arc;

use crate::error::{AppError, AppResult};
use crate::models::{Notification, NotificationPayload};
use crate::repository::NotificationRepository;
use crate::services::sanitize::sanitize_notification;
use crate::websocket::ConnectionRegistry;

/// Turns a domain event from any other feature into a durable notification
/// and pushes it live when the target user is connected.
#[derive(Clone)]
pub struct NotificationDispatcher {
    repository: Arc<dyn NotificationRepository>,
    registry: ConnectionRegistry,
}

impl NotificationDispatcher {
    pub fn new(repository: Arc<dyn NotificationRepository>, registry: ConnectionRegistry) -> Self {
        Self {
            repository,
            registry,
        }
    }

    /// Persist the notification, re-read its canonical joined form, then
    /// best-effort push it to the target user's live connections. A failed
    /// push is logged and swallowed: the unread listing is the recovery
    /// path for offline users. Persistence errors propagate to the caller.
    pub async fn dispatch(
        &self,
        user_id: i64,
        payload: NotificationPayload,
    ) -> AppResult<Notification> {
        let id = self.repository.create(user_id, &payload).await?;

        let notification = self
            .repository
            .get(id)
            .await?
            .ok_or(AppError::Internal)?;

        let outbound = sanitize_notification(notification.clone());
        if let Err(e) = self.registry.broadcast(user_id, &outbound).await {
            tracing::warn!(
                user_id,
                notification_id = id,
                error = %e,
                "live notification push failed; client will catch up from the unread list"
            );
        }

        Ok(notification)
    }
}
