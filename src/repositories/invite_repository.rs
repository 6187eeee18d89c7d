use crate::error::RepoResult;
use crate::models::{GroupInvite, InviteStatus, InviteView};
use sqlx::PgPool;
use uuid::Uuid;

const INVITE_COLUMNS: &str =
    "id, group_id, invited_by, invited_user, status, created_at, responded_at";

/// Repository for group invitations
pub struct InviteRepository {
    pool: PgPool,
}

impl InviteRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn create(
        &self,
        group_id: Uuid,
        invited_by: Uuid,
        invited_user: Uuid,
    ) -> RepoResult<GroupInvite> {
        let invite = sqlx::query_as::<_, GroupInvite>(&format!(
            r#"
            INSERT INTO group_invites (group_id, invited_by, invited_user)
            VALUES ($1, $2, $3)
            RETURNING {INVITE_COLUMNS}
            "#
        ))
        .bind(group_id)
        .bind(invited_by)
        .bind(invited_user)
        .fetch_one(&self.pool)
        .await?;

        Ok(invite)
    }

    pub async fn find(&self, id: Uuid) -> RepoResult<Option<GroupInvite>> {
        let invite = sqlx::query_as::<_, GroupInvite>(&format!(
            "SELECT {INVITE_COLUMNS} FROM group_invites WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(invite)
    }

    pub async fn has_pending(&self, group_id: Uuid, invited_user: Uuid) -> RepoResult<bool> {
        let exists: bool = sqlx::query_scalar(
            r#"
            SELECT EXISTS (
                SELECT 1 FROM group_invites
                WHERE group_id = $1 AND invited_user = $2 AND status = 'pending'
            )
            "#,
        )
        .bind(group_id)
        .bind(invited_user)
        .fetch_one(&self.pool)
        .await?;

        Ok(exists)
    }

    /// Pending invites addressed to a user
    pub async fn find_pending_for_user(&self, user_id: Uuid) -> RepoResult<Vec<InviteView>> {
        let invites = sqlx::query_as::<_, InviteView>(
            r#"
            SELECT i.id, i.group_id, g.name AS group_name, i.invited_by,
                   u.username AS inviter_username, i.created_at
            FROM group_invites i
            JOIN groups g ON g.id = i.group_id
            JOIN users u ON u.id = i.invited_by
            WHERE i.invited_user = $1 AND i.status = 'pending'
            ORDER BY i.created_at DESC
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(invites)
    }

    /// Move a pending invite to a final status. `None` if it was no longer pending.
    pub async fn respond(&self, id: Uuid, status: InviteStatus) -> RepoResult<Option<GroupInvite>> {
        let invite = sqlx::query_as::<_, GroupInvite>(&format!(
            r#"
            UPDATE group_invites
            SET status = $2, responded_at = NOW()
            WHERE id = $1 AND status = 'pending'
            RETURNING {INVITE_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(status.as_str())
        .fetch_optional(&self.pool)
        .await?;

        Ok(invite)
    }
}
