use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Type-specific notification payload. The serde tag is the same
/// discriminant string persisted in `notifications.kind`, so the stored type
/// and the reconstructed shape cannot drift apart.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum NotificationPayload {
    NewPin { pin_id: i64 },
    NewLike { pin_id: i64, author_id: i64 },
    NewComment { pin_id: i64, author_id: i64, text: String },
    NewFollower { follower_id: i64 },
}

impl NotificationPayload {
    pub fn kind(&self) -> &'static str {
        match self {
            NotificationPayload::NewPin { .. } => "new_pin",
            NotificationPayload::NewLike { .. } => "new_like",
            NotificationPayload::NewComment { .. } => "new_comment",
            NotificationPayload::NewFollower { .. } => "new_follower",
        }
    }
}

/// Canonical notification as pushed over the wire: base fields plus the
/// flattened typed payload, no envelope.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Notification {
    pub id: i64,
    pub user_id: i64,
    #[serde(flatten)]
    pub payload: NotificationPayload,
    pub is_read: bool,
    pub created_at: DateTime<Utc>,
}
