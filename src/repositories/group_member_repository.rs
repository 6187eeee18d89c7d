use crate::error::RepoResult;
use crate::models::{GroupMember, MemberProfile, MemberRole};
use sqlx::PgPool;
use uuid::Uuid;

/// Repository for group member data access
pub struct GroupMemberRepository {
    pool: PgPool,
}

impl GroupMemberRepository {
    /// Create a new GroupMemberRepository
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Add a member to a group
    pub async fn add_member(
        &self,
        group_id: Uuid,
        user_id: Uuid,
        role: MemberRole,
    ) -> RepoResult<GroupMember> {
        let member = sqlx::query_as::<_, GroupMember>(
            r#"
            INSERT INTO group_members (group_id, user_id, role)
            VALUES ($1, $2, $3)
            ON CONFLICT (group_id, user_id) DO UPDATE
            SET role = EXCLUDED.role
            RETURNING group_id, user_id, role, joined_at
            "#,
        )
        .bind(group_id)
        .bind(user_id)
        .bind(role.as_str())
        .fetch_one(&self.pool)
        .await?;

        Ok(member)
    }

    /// Remove a member from a group
    pub async fn remove_member(&self, group_id: Uuid, user_id: Uuid) -> RepoResult<bool> {
        let rows_affected =
            sqlx::query("DELETE FROM group_members WHERE group_id = $1 AND user_id = $2")
                .bind(group_id)
                .bind(user_id)
                .execute(&self.pool)
                .await?
                .rows_affected();

        Ok(rows_affected > 0)
    }

    /// All members of a group with their profiles, oldest first
    pub async fn find_by_group(&self, group_id: Uuid) -> RepoResult<Vec<MemberProfile>> {
        let members = sqlx::query_as::<_, MemberProfile>(
            r#"
            SELECT gm.user_id, u.username, u.full_name, gm.role, gm.joined_at
            FROM group_members gm
            JOIN users u ON u.id = gm.user_id
            WHERE gm.group_id = $1
            ORDER BY gm.joined_at ASC
            "#,
        )
        .bind(group_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(members)
    }

    /// Membership row for one user, if any
    pub async fn find_membership(
        &self,
        group_id: Uuid,
        user_id: Uuid,
    ) -> RepoResult<Option<GroupMember>> {
        let member = sqlx::query_as::<_, GroupMember>(
            r#"
            SELECT group_id, user_id, role, joined_at
            FROM group_members
            WHERE group_id = $1 AND user_id = $2
            "#,
        )
        .bind(group_id)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(member)
    }

    /// Check if a user is a member of a group
    pub async fn is_member(&self, group_id: Uuid, user_id: Uuid) -> RepoResult<bool> {
        Ok(self.find_membership(group_id, user_id).await?.is_some())
    }

    /// How many of `user_ids` belong to the group
    pub async fn count_members_among(&self, group_id: Uuid, user_ids: &[Uuid]) -> RepoResult<i64> {
        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM group_members WHERE group_id = $1 AND user_id = ANY($2)",
        )
        .bind(group_id)
        .bind(user_ids)
        .fetch_one(&self.pool)
        .await?;

        Ok(count)
    }

    /// Update a member's role
    pub async fn update_role(
        &self,
        group_id: Uuid,
        user_id: Uuid,
        role: MemberRole,
    ) -> RepoResult<GroupMember> {
        let member = sqlx::query_as::<_, GroupMember>(
            r#"
            UPDATE group_members
            SET role = $3
            WHERE group_id = $1 AND user_id = $2
            RETURNING group_id, user_id, role, joined_at
            "#,
        )
        .bind(group_id)
        .bind(user_id)
        .bind(role.as_str())
        .fetch_one(&self.pool)
        .await?;

        Ok(member)
    }

    /// Get member count for a group
    pub async fn count_by_group(&self, group_id: Uuid) -> RepoResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM group_members WHERE group_id = $1")
            .bind(group_id)
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }

    pub async fn count_admins(&self, group_id: Uuid) -> RepoResult<i64> {
        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM group_members WHERE group_id = $1 AND role = 'admin'",
        )
        .bind(group_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(count)
    }

    /// Longest-standing member other than `exclude`
    pub async fn find_oldest_other(
        &self,
        group_id: Uuid,
        exclude: Uuid,
    ) -> RepoResult<Option<GroupMember>> {
        let member = sqlx::query_as::<_, GroupMember>(
            r#"
            SELECT group_id, user_id, role, joined_at
            FROM group_members
            WHERE group_id = $1 AND user_id <> $2
            ORDER BY joined_at ASC
            LIMIT 1
            "#,
        )
        .bind(group_id)
        .bind(exclude)
        .fetch_optional(&self.pool)
        .await?;

        Ok(member)
    }
}
