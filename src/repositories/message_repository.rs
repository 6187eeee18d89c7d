use crate::error::RepoResult;
use crate::models::GroupMessage;
use chrono::NaiveDateTime;
use sqlx::PgPool;
use uuid::Uuid;

/// Repository for group chat messages
pub struct MessageRepository {
    pool: PgPool,
}

impl MessageRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn create(&self, group_id: Uuid, user_id: Uuid, content: &str) -> RepoResult<GroupMessage> {
        let message = sqlx::query_as::<_, GroupMessage>(
            r#"
            WITH inserted AS (
                INSERT INTO group_messages (group_id, user_id, content)
                VALUES ($1, $2, $3)
                RETURNING id, group_id, user_id, content, created_at
            )
            SELECT i.id, i.group_id, i.user_id, u.username, u.full_name, i.content, i.created_at
            FROM inserted i
            JOIN users u ON u.id = i.user_id
            "#,
        )
        .bind(group_id)
        .bind(user_id)
        .bind(content)
        .fetch_one(&self.pool)
        .await?;

        Ok(message)
    }

    /// Newest `limit` messages strictly before `before`, returned oldest first
    pub async fn find_by_group(
        &self,
        group_id: Uuid,
        limit: i64,
        before: Option<NaiveDateTime>,
    ) -> RepoResult<Vec<GroupMessage>> {
        let mut messages = sqlx::query_as::<_, GroupMessage>(
            r#"
            SELECT m.id, m.group_id, m.user_id, u.username, u.full_name, m.content, m.created_at
            FROM group_messages m
            JOIN users u ON u.id = m.user_id
            WHERE m.group_id = $1 AND ($2::TIMESTAMP IS NULL OR m.created_at < $2)
            ORDER BY m.created_at DESC
            LIMIT $3
            "#,
        )
        .bind(group_id)
        .bind(before)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        messages.reverse();
        Ok(messages)
    }
}
