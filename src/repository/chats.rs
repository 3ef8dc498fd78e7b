use async_trait::async_trait;
use sqlx::{Pool, Postgres};

use crate::error::{AppError, AppResult};
use crate::models::{Chat, Message};

/// Chat and message persistence, owned by the relational store.
#[async_trait]
pub trait ChatRepository: Send + Sync {
    /// Create the chat for a participant pair. Returns
    /// `AppError::ChatAlreadyExists` when another writer won the
    /// unique-pair race.
    async fn create(&self, user1_id: i64, user2_id: i64) -> AppResult<Chat>;
    async fn get(&self, id: i64) -> AppResult<Option<Chat>>;
    async fn list_by_user(&self, user_id: i64) -> AppResult<Vec<Chat>>;
    async fn get_by_users(&self, user1_id: i64, user2_id: i64) -> AppResult<Option<Chat>>;
    async fn chat_exists(&self, user1_id: i64, user2_id: i64) -> AppResult<bool>;
    async fn create_message(&self, author_id: i64, chat_id: i64, text: &str) -> AppResult<Message>;
    async fn messages_list(&self, chat_id: i64) -> AppResult<Vec<Message>>;
}

pub struct PgChatRepository {
    db: Pool<Postgres>,
}

impl PgChatRepository {
    pub fn new(db: Pool<Postgres>) -> Self {
        Self { db }
    }
}

#[async_trait]
impl ChatRepository for PgChatRepository {
    async fn create(&self, user1_id: i64, user2_id: i64) -> AppResult<Chat> {
        if user1_id == user2_id {
            return Err(AppError::BadRequest("chat participants must differ".into()));
        }

        let chat = sqlx::query_as::<_, Chat>(
            "INSERT INTO chats (user1_id, user2_id) VALUES ($1, $2) \
             RETURNING id, user1_id, user2_id, created_at, updated_at",
        )
        .bind(user1_id)
        .bind(user2_id)
        .fetch_one(&self.db)
        .await
        .map_err(|e| match &e {
            sqlx::Error::Database(db_err) if db_err.is_unique_violation() => {
                AppError::ChatAlreadyExists
            }
            _ => AppError::Database(e),
        })?;

        Ok(chat)
    }

    async fn get(&self, id: i64) -> AppResult<Option<Chat>> {
        let chat = sqlx::query_as::<_, Chat>(
            "SELECT id, user1_id, user2_id, created_at, updated_at FROM chats WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.db)
        .await?;
        Ok(chat)
    }

    async fn list_by_user(&self, user_id: i64) -> AppResult<Vec<Chat>> {
        let chats = sqlx::query_as::<_, Chat>(
            "SELECT id, user1_id, user2_id, created_at, updated_at FROM chats \
             WHERE user1_id = $1 OR user2_id = $1 \
             ORDER BY updated_at DESC \
             LIMIT 100",
        )
        .bind(user_id)
        .fetch_all(&self.db)
        .await?;
        Ok(chats)
    }

    async fn get_by_users(&self, user1_id: i64, user2_id: i64) -> AppResult<Option<Chat>> {
        let chat = sqlx::query_as::<_, Chat>(
            "SELECT id, user1_id, user2_id, created_at, updated_at FROM chats \
             WHERE (user1_id = $1 AND user2_id = $2) OR (user1_id = $2 AND user2_id = $1)",
        )
        .bind(user1_id)
        .bind(user2_id)
        .fetch_optional(&self.db)
        .await?;
        Ok(chat)
    }

    async fn chat_exists(&self, user1_id: i64, user2_id: i64) -> AppResult<bool> {
        let row = sqlx::query(
            "SELECT 1 FROM chats \
             WHERE (user1_id = $1 AND user2_id = $2) OR (user1_id = $2 AND user2_id = $1) \
             LIMIT 1",
        )
        .bind(user1_id)
        .bind(user2_id)
        .fetch_optional(&self.db)
        .await?;
        Ok(row.is_some())
    }

    async fn create_message(&self, author_id: i64, chat_id: i64, text: &str) -> AppResult<Message> {
        let mut tx = self.db.begin().await?;

        let chat = sqlx::query_as::<_, Chat>(
            "SELECT id, user1_id, user2_id, created_at, updated_at FROM chats WHERE id = $1",
        )
        .bind(chat_id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or(AppError::NotFound)?;

        if !chat.has_participant(author_id) {
            return Err(AppError::Forbidden);
        }

        let message = sqlx::query_as::<_, Message>(
            "INSERT INTO messages (chat_id, author_id, text) VALUES ($1, $2, $3) \
             RETURNING id, author_id, chat_id, text, created_at",
        )
        .bind(chat_id)
        .bind(author_id)
        .bind(text)
        .fetch_one(&mut *tx)
        .await?;

        sqlx::query("UPDATE chats SET updated_at = NOW() WHERE id = $1")
            .bind(chat_id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        Ok(message)
    }

    async fn messages_list(&self, chat_id: i64) -> AppResult<Vec<Message>> {
        let messages = sqlx::query_as::<_, Message>(
            "SELECT id, author_id, chat_id, text, created_at FROM messages \
             WHERE chat_id = $1 \
             ORDER BY created_at ASC, id ASC",
        )
        .bind(chat_id)
        .fetch_all(&self.db)
        .await?;
        Ok(messages)
    }
}
