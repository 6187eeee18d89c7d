use crate::error::RepoResult;
use crate::models::UpiId;
use sqlx::PgPool;
use uuid::Uuid;

const UPI_COLUMNS: &str = "id, user_id, upi_id, display_name, is_default, created_at";

/// Repository for UPI payment handles
pub struct UpiRepository {
    pool: PgPool,
}

impl UpiRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Default first, then oldest first
    pub async fn find_by_user(&self, user_id: Uuid) -> RepoResult<Vec<UpiId>> {
        let rows = sqlx::query_as::<_, UpiId>(&format!(
            "SELECT {UPI_COLUMNS} FROM upi_ids WHERE user_id = $1 ORDER BY is_default DESC, created_at ASC"
        ))
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }

    pub async fn find(&self, id: Uuid, user_id: Uuid) -> RepoResult<Option<UpiId>> {
        let row = sqlx::query_as::<_, UpiId>(&format!(
            "SELECT {UPI_COLUMNS} FROM upi_ids WHERE id = $1 AND user_id = $2"
        ))
        .bind(id)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row)
    }

    pub async fn count_by_user(&self, user_id: Uuid) -> RepoResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM upi_ids WHERE user_id = $1")
            .bind(user_id)
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }

    pub async fn create(
        &self,
        user_id: Uuid,
        upi_id: &str,
        display_name: Option<&str>,
        is_default: bool,
    ) -> RepoResult<UpiId> {
        let row = sqlx::query_as::<_, UpiId>(&format!(
            r#"
            INSERT INTO upi_ids (user_id, upi_id, display_name, is_default)
            VALUES ($1, $2, $3, $4)
            RETURNING {UPI_COLUMNS}
            "#
        ))
        .bind(user_id)
        .bind(upi_id)
        .bind(display_name)
        .bind(is_default)
        .fetch_one(&self.pool)
        .await?;

        Ok(row)
    }

    pub async fn update(
        &self,
        id: Uuid,
        user_id: Uuid,
        upi_id: Option<&str>,
        display_name: Option<&str>,
    ) -> RepoResult<Option<UpiId>> {
        let row = sqlx::query_as::<_, UpiId>(&format!(
            r#"
            UPDATE upi_ids
            SET upi_id = COALESCE($3, upi_id), display_name = COALESCE($4, display_name)
            WHERE id = $1 AND user_id = $2
            RETURNING {UPI_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(user_id)
        .bind(upi_id)
        .bind(display_name)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row)
    }

    /// Make `id` the user's only default
    pub async fn set_default(&self, id: Uuid, user_id: Uuid) -> RepoResult<()> {
        sqlx::query("UPDATE upi_ids SET is_default = (id = $1) WHERE user_id = $2")
            .bind(id)
            .bind(user_id)
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    pub async fn delete(&self, id: Uuid, user_id: Uuid) -> RepoResult<bool> {
        let rows_affected = sqlx::query("DELETE FROM upi_ids WHERE id = $1 AND user_id = $2")
            .bind(id)
            .bind(user_id)
            .execute(&self.pool)
            .await?
            .rows_affected();

        Ok(rows_affected > 0)
    }

    pub async fn find_oldest(&self, user_id: Uuid) -> RepoResult<Option<UpiId>> {
        let row = sqlx::query_as::<_, UpiId>(&format!(
            "SELECT {UPI_COLUMNS} FROM upi_ids WHERE user_id = $1 ORDER BY created_at ASC LIMIT 1"
        ))
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row)
    }
}
