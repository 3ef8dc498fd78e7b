use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Message {
    pub id: i64,
    pub author_id: i64,
    pub chat_id: i64,
    pub text: String,
    pub created_at: DateTime<Utc>,
}
