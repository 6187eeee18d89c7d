use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Group chat message with the sender's username
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct GroupMessage {
    pub id: Uuid,
    pub group_id: Uuid,
    pub user_id: Uuid,
    pub username: Option<String>,
    pub full_name: Option<String>,
    pub content: String,
    pub created_at: NaiveDateTime,
}
