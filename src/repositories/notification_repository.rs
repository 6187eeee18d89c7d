use crate::error::RepoResult;
use crate::models::{NewNotification, Notification};
use sqlx::PgPool;
use uuid::Uuid;

const NOTIFICATION_COLUMNS: &str = "id, user_id, kind, title, message, data, is_read, created_at";

/// Repository for in-app notifications
pub struct NotificationRepository {
    pool: PgPool,
}

impl NotificationRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn create(&self, notification: &NewNotification) -> RepoResult<Notification> {
        let row = sqlx::query_as::<_, Notification>(&format!(
            r#"
            INSERT INTO notifications (user_id, kind, title, message, data)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING {NOTIFICATION_COLUMNS}
            "#
        ))
        .bind(notification.user_id)
        .bind(notification.kind.as_str())
        .bind(&notification.title)
        .bind(&notification.message)
        .bind(&notification.data)
        .fetch_one(&self.pool)
        .await?;

        Ok(row)
    }

    pub async fn find_by_user(
        &self,
        user_id: Uuid,
        unread_only: bool,
        limit: i64,
    ) -> RepoResult<Vec<Notification>> {
        let rows = sqlx::query_as::<_, Notification>(&format!(
            r#"
            SELECT {NOTIFICATION_COLUMNS}
            FROM notifications
            WHERE user_id = $1 AND (NOT $2 OR is_read = FALSE)
            ORDER BY created_at DESC
            LIMIT $3
            "#
        ))
        .bind(user_id)
        .bind(unread_only)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }

    pub async fn count_unread(&self, user_id: Uuid) -> RepoResult<i64> {
        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM notifications WHERE user_id = $1 AND is_read = FALSE",
        )
        .bind(user_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(count)
    }

    /// Mark selected notifications read; ids owned by other users are ignored
    pub async fn mark_read(&self, user_id: Uuid, ids: &[Uuid]) -> RepoResult<u64> {
        let rows_affected = sqlx::query(
            r#"
            UPDATE notifications SET is_read = TRUE
            WHERE user_id = $1 AND id = ANY($2) AND is_read = FALSE
            "#,
        )
        .bind(user_id)
        .bind(ids)
        .execute(&self.pool)
        .await?
        .rows_affected();

        Ok(rows_affected)
    }

    pub async fn mark_all_read(&self, user_id: Uuid) -> RepoResult<u64> {
        let rows_affected = sqlx::query(
            "UPDATE notifications SET is_read = TRUE WHERE user_id = $1 AND is_read = FALSE",
        )
        .bind(user_id)
        .execute(&self.pool)
        .await?
        .rows_affected();

        Ok(rows_affected)
    }
}
