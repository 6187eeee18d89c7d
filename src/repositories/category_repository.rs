use crate::error::RepoResult;
use crate::models::Category;
use sqlx::PgPool;
use uuid::Uuid;

const CATEGORY_COLUMNS: &str = "id, user_id, name, category_type, color, icon, created_at";

/// Repository for category data access. Every query is scoped to the owner.
pub struct CategoryRepository {
    pool: PgPool,
}

impl CategoryRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// List a user's categories, optionally of one type
    pub async fn find_by_user(
        &self,
        user_id: Uuid,
        category_type: Option<&str>,
    ) -> RepoResult<Vec<Category>> {
        let categories = sqlx::query_as::<_, Category>(&format!(
            r#"
            SELECT {CATEGORY_COLUMNS}
            FROM categories
            WHERE user_id = $1 AND ($2::TEXT IS NULL OR category_type = $2)
            ORDER BY category_type ASC, name ASC
            "#
        ))
        .bind(user_id)
        .bind(category_type)
        .fetch_all(&self.pool)
        .await?;

        Ok(categories)
    }

    pub async fn find(&self, id: Uuid, user_id: Uuid) -> RepoResult<Option<Category>> {
        let category = sqlx::query_as::<_, Category>(&format!(
            "SELECT {CATEGORY_COLUMNS} FROM categories WHERE id = $1 AND user_id = $2"
        ))
        .bind(id)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(category)
    }

    pub async fn create(
        &self,
        user_id: Uuid,
        name: &str,
        category_type: &str,
        color: Option<&str>,
        icon: Option<&str>,
    ) -> RepoResult<Category> {
        let category = sqlx::query_as::<_, Category>(&format!(
            r#"
            INSERT INTO categories (user_id, name, category_type, color, icon)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING {CATEGORY_COLUMNS}
            "#
        ))
        .bind(user_id)
        .bind(name)
        .bind(category_type)
        .bind(color)
        .bind(icon)
        .fetch_one(&self.pool)
        .await?;

        Ok(category)
    }

    /// Partial update; `None` keeps the stored value
    pub async fn update(
        &self,
        id: Uuid,
        user_id: Uuid,
        name: Option<&str>,
        color: Option<&str>,
        icon: Option<&str>,
    ) -> RepoResult<Option<Category>> {
        let category = sqlx::query_as::<_, Category>(&format!(
            r#"
            UPDATE categories
            SET name = COALESCE($3, name), color = COALESCE($4, color), icon = COALESCE($5, icon)
            WHERE id = $1 AND user_id = $2
            RETURNING {CATEGORY_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(user_id)
        .bind(name)
        .bind(color)
        .bind(icon)
        .fetch_optional(&self.pool)
        .await?;

        Ok(category)
    }

    pub async fn delete(&self, id: Uuid, user_id: Uuid) -> RepoResult<bool> {
        let rows_affected = sqlx::query("DELETE FROM categories WHERE id = $1 AND user_id = $2")
            .bind(id)
            .bind(user_id)
            .execute(&self.pool)
            .await?
            .rows_affected();

        Ok(rows_affected > 0)
    }
}
