use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::postgres::PgRow;
use sqlx::{Pool, Postgres, Row};

use crate::error::{AppError, AppResult};
use crate::models::{Notification, NotificationPayload};

/// Notification persistence: a base row plus exactly one type-specific side
/// row chosen by the payload discriminant.
#[async_trait]
pub trait NotificationRepository: Send + Sync {
    async fn create(&self, user_id: i64, payload: &NotificationPayload) -> AppResult<i64>;
    async fn get(&self, id: i64) -> AppResult<Option<Notification>>;
    async fn list_unread_by_user(&self, user_id: i64) -> AppResult<Vec<Notification>>;
    async fn mark_as_read(&self, id: i64, user_id: i64) -> AppResult<()>;
}

pub struct PgNotificationRepository {
    db: Pool<Postgres>,
}

impl PgNotificationRepository {
    pub fn new(db: Pool<Postgres>) -> Self {
        Self { db }
    }
}

const JOINED_SELECT: &str = "SELECT n.id, n.user_id, n.kind, n.is_read, n.created_at, \
       np.pin_id AS pin_pin_id, \
       nl.pin_id AS like_pin_id, nl.author_id AS like_author_id, \
       nc.pin_id AS comment_pin_id, nc.author_id AS comment_author_id, nc.text AS comment_text, \
       nf.follower_id AS follower_follower_id \
 FROM notifications n \
 LEFT JOIN notification_pins np ON np.notification_id = n.id \
 LEFT JOIN notification_likes nl ON nl.notification_id = n.id \
 LEFT JOIN notification_comments nc ON nc.notification_id = n.id \
 LEFT JOIN notification_followers nf ON nf.notification_id = n.id";

fn row_to_notification(row: &PgRow) -> AppResult<Notification> {
    let id: i64 = row.try_get("id")?;
    let user_id: i64 = row.try_get("user_id")?;
    let kind: String = row.try_get("kind")?;
    let is_read: bool = row.try_get("is_read")?;
    let created_at: DateTime<Utc> = row.try_get("created_at")?;

    fn side_row_missing(id: i64, kind: &str) -> AppError {
        tracing::error!(notification_id = id, kind = %kind, "notification side row missing");
        AppError::Internal
    }

    let payload = match kind.as_str() {
        "new_pin" => NotificationPayload::NewPin {
            pin_id: row
                .try_get::<Option<i64>, _>("pin_pin_id")?
                .ok_or_else(|| side_row_missing(id, &kind))?,
        },
        "new_like" => NotificationPayload::NewLike {
            pin_id: row
                .try_get::<Option<i64>, _>("like_pin_id")?
                .ok_or_else(|| side_row_missing(id, &kind))?,
            author_id: row
                .try_get::<Option<i64>, _>("like_author_id")?
                .ok_or_else(|| side_row_missing(id, &kind))?,
        },
        "new_comment" => NotificationPayload::NewComment {
            pin_id: row
                .try_get::<Option<i64>, _>("comment_pin_id")?
                .ok_or_else(|| side_row_missing(id, &kind))?,
            author_id: row
                .try_get::<Option<i64>, _>("comment_author_id")?
                .ok_or_else(|| side_row_missing(id, &kind))?,
            text: row
                .try_get::<Option<String>, _>("comment_text")?
                .ok_or_else(|| side_row_missing(id, &kind))?,
        },
        "new_follower" => NotificationPayload::NewFollower {
            follower_id: row
                .try_get::<Option<i64>, _>("follower_follower_id")?
                .ok_or_else(|| side_row_missing(id, &kind))?,
        },
        other => {
            tracing::error!(notification_id = id, kind = %other, "unknown notification kind");
            return Err(AppError::Internal);
        }
    };

    Ok(Notification {
        id,
        user_id,
        payload,
        is_read,
        created_at,
    })
}

#[async_trait]
impl NotificationRepository for PgNotificationRepository {
    async fn create(&self, user_id: i64, payload: &NotificationPayload) -> AppResult<i64> {
        let mut tx = self.db.begin().await?;

        let id: i64 =
            sqlx::query_scalar("INSERT INTO notifications (user_id, kind) VALUES ($1, $2) RETURNING id")
                .bind(user_id)
                .bind(payload.kind())
                .fetch_one(&mut *tx)
                .await?;

        match payload {
            NotificationPayload::NewPin { pin_id } => {
                sqlx::query("INSERT INTO notification_pins (notification_id, pin_id) VALUES ($1, $2)")
                    .bind(id)
                    .bind(pin_id)
                    .execute(&mut *tx)
                    .await?;
            }
            NotificationPayload::NewLike { pin_id, author_id } => {
                sqlx::query(
                    "INSERT INTO notification_likes (notification_id, pin_id, author_id) \
                     VALUES ($1, $2, $3)",
                )
                .bind(id)
                .bind(pin_id)
                .bind(author_id)
                .execute(&mut *tx)
                .await?;
            }
            NotificationPayload::NewComment {
                pin_id,
                author_id,
                text,
            } => {
                sqlx::query(
                    "INSERT INTO notification_comments (notification_id, pin_id, author_id, text) \
                     VALUES ($1, $2, $3, $4)",
                )
                .bind(id)
                .bind(pin_id)
                .bind(author_id)
                .bind(text)
                .execute(&mut *tx)
                .await?;
            }
            NotificationPayload::NewFollower { follower_id } => {
                sqlx::query(
                    "INSERT INTO notification_followers (notification_id, follower_id) \
                     VALUES ($1, $2)",
                )
                .bind(id)
                .bind(follower_id)
                .execute(&mut *tx)
                .await?;
            }
        }

        tx.commit().await?;

        Ok(id)
    }

    async fn get(&self, id: i64) -> AppResult<Option<Notification>> {
        let sql = format!("{JOINED_SELECT} WHERE n.id = $1");
        let row = sqlx::query(&sql).bind(id).fetch_optional(&self.db).await?;

        match row {
            Some(row) => Ok(Some(row_to_notification(&row)?)),
            None => Ok(None),
        }
    }

    async fn list_unread_by_user(&self, user_id: i64) -> AppResult<Vec<Notification>> {
        let sql = format!(
            "{JOINED_SELECT} WHERE n.user_id = $1 AND NOT n.is_read ORDER BY n.created_at DESC"
        );
        let rows = sqlx::query(&sql).bind(user_id).fetch_all(&self.db).await?;

        rows.iter().map(row_to_notification).collect()
    }

    async fn mark_as_read(&self, id: i64, user_id: i64) -> AppResult<()> {
        let result = sqlx::query(
            "UPDATE notifications SET is_read = TRUE WHERE id = $1 AND user_id = $2",
        )
        .bind(id)
        .bind(user_id)
        .execute(&self.db)
        .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound);
        }

        Ok(())
    }
}
