use crate::error::RepoResult;
use crate::models::{Group, GroupSummary};
use sqlx::PgPool;
use uuid::Uuid;

const GROUP_COLUMNS: &str = "id, name, description, created_by, created_at, updated_at";

/// Repository for group data access
pub struct GroupRepository {
    pool: PgPool,
}

impl GroupRepository {
    /// Create a new GroupRepository
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Insert a new group
    pub async fn create(
        &self,
        name: &str,
        description: Option<&str>,
        created_by: Uuid,
    ) -> RepoResult<Group> {
        let group = sqlx::query_as::<_, Group>(&format!(
            r#"
            INSERT INTO groups (name, description, created_by)
            VALUES ($1, $2, $3)
            RETURNING {GROUP_COLUMNS}
            "#
        ))
        .bind(name)
        .bind(description)
        .bind(created_by)
        .fetch_one(&self.pool)
        .await?;

        Ok(group)
    }

    /// Find a group by UUID
    pub async fn find_by_id(&self, id: Uuid) -> RepoResult<Option<Group>> {
        let group = sqlx::query_as::<_, Group>(&format!(
            "SELECT {GROUP_COLUMNS} FROM groups WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(group)
    }

    /// Groups a user belongs to, with member counts and the user's role
    pub async fn find_for_user(&self, user_id: Uuid) -> RepoResult<Vec<GroupSummary>> {
        let groups = sqlx::query_as::<_, GroupSummary>(
            r#"
            SELECT g.id, g.name, g.description, g.created_by, g.created_at,
                   (SELECT COUNT(*) FROM group_members m WHERE m.group_id = g.id) AS member_count,
                   gm.role
            FROM groups g
            JOIN group_members gm ON gm.group_id = g.id AND gm.user_id = $1
            ORDER BY g.created_at DESC
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(groups)
    }

    /// Update name and/or description
    pub async fn update(
        &self,
        id: Uuid,
        name: Option<&str>,
        description: Option<&str>,
    ) -> RepoResult<Option<Group>> {
        let group = sqlx::query_as::<_, Group>(&format!(
            r#"
            UPDATE groups
            SET name = COALESCE($2, name), description = COALESCE($3, description), updated_at = NOW()
            WHERE id = $1
            RETURNING {GROUP_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(name)
        .bind(description)
        .fetch_optional(&self.pool)
        .await?;

        Ok(group)
    }

    /// Delete a group (cascades to members, expenses, messages and invites)
    pub async fn delete(&self, id: Uuid) -> RepoResult<bool> {
        let rows_affected = sqlx::query("DELETE FROM groups WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?
            .rows_affected();

        Ok(rows_affected > 0)
    }
}
