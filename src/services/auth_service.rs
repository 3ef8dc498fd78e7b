use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{Pool, Postgres, Row};

use crate::error::{AppError, AppResult};

/// Authenticated caller, attached to request extensions by the auth
/// middleware and resolved before a socket upgrade.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Principal {
    pub user_id: i64,
}

/// Session authenticator. The auth service owns credential handling; this
/// service only asks whether a (user, session) pair is currently valid.
#[async_trait]
pub trait AuthService: Send + Sync {
    async fn check_auth(&self, user_id: i64, session_id: &str) -> AppResult<Principal>;
}

/// Validates sessions against the shared sessions table.
pub struct PgSessionAuth {
    db: Pool<Postgres>,
}

impl PgSessionAuth {
    pub fn new(db: Pool<Postgres>) -> Self {
        Self { db }
    }
}

#[async_trait]
impl AuthService for PgSessionAuth {
    async fn check_auth(&self, user_id: i64, session_id: &str) -> AppResult<Principal> {
        let row = sqlx::query("SELECT user_id, expires_at FROM sessions WHERE id = $1")
            .bind(session_id)
            .fetch_optional(&self.db)
            .await?;

        let Some(row) = row else {
            return Err(AppError::Unauthorized);
        };

        let owner: i64 = row.try_get("user_id")?;
        let expires_at: DateTime<Utc> = row.try_get("expires_at")?;

        if owner != user_id || expires_at <= Utc::now() {
            return Err(AppError::Unauthorized);
        }

        Ok(Principal { user_id })
    }
}
