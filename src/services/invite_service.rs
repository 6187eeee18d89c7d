use crate::error::{AppError, AppResult};
use crate::models::{GroupInvite, InviteStatus, InviteView, MemberRole, NewNotification, NotificationKind};
use crate::repositories::{GroupMemberRepository, GroupRepository, InviteRepository, UserRepository};
use crate::services::NotificationService;
use serde_json::json;
use std::sync::Arc;
use tracing::{error, info};
use uuid::Uuid;

/// Responses to group invitations
pub struct InviteService {
    invite_repo: Arc<InviteRepository>,
    group_repo: Arc<GroupRepository>,
    member_repo: Arc<GroupMemberRepository>,
    user_repo: Arc<UserRepository>,
    notifications: Arc<NotificationService>,
}

impl InviteService {
    pub fn new(
        invite_repo: Arc<InviteRepository>,
        group_repo: Arc<GroupRepository>,
        member_repo: Arc<GroupMemberRepository>,
        user_repo: Arc<UserRepository>,
        notifications: Arc<NotificationService>,
    ) -> Self {
        Self {
            invite_repo,
            group_repo,
            member_repo,
            user_repo,
            notifications,
        }
    }

    pub async fn pending(&self, user_id: Uuid) -> AppResult<Vec<InviteView>> {
        Ok(self.invite_repo.find_pending_for_user(user_id).await?)
    }

    /// Invite addressed to `user_id` that is still pending
    async fn pending_invite(&self, invite_id: Uuid, user_id: Uuid) -> AppResult<GroupInvite> {
        let invite = self
            .invite_repo
            .find(invite_id)
            .await?
            .filter(|i| i.invited_user == user_id)
            .ok_or_else(|| AppError::NotFound("Invite not found".to_string()))?;

        if !invite.is_pending() {
            return Err(AppError::BusinessLogic(format!(
                "Invite has already been {}",
                invite.status_enum().as_str()
            )));
        }
        Ok(invite)
    }

    async fn respond(&self, invite: &GroupInvite, status: InviteStatus) -> AppResult<GroupInvite> {
        self.invite_repo
            .respond(invite.id, status)
            .await?
            .ok_or_else(|| AppError::BusinessLogic("Invite is no longer pending".to_string()))
    }

    /// Join the group as a regular member and tell the inviter
    pub async fn accept(&self, invite_id: Uuid, user_id: Uuid) -> AppResult<GroupInvite> {
        let invite = self.pending_invite(invite_id, user_id).await?;
        let group = self
            .group_repo
            .find_by_id(invite.group_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Group not found".to_string()))?;

        // Membership first, so a failed insert leaves the invite pending
        let joined = !self.member_repo.is_member(group.id, user_id).await?;
        if joined {
            self.member_repo
                .add_member(group.id, user_id, MemberRole::Member)
                .await?;
        }

        let accepted = match self.respond(&invite, InviteStatus::Accepted).await {
            Ok(accepted) => accepted,
            Err(e) => {
                if joined {
                    if let Err(cleanup) = self.member_repo.remove_member(group.id, user_id).await {
                        error!("Failed to undo membership of {} in {}: {}", user_id, group.id, cleanup);
                    }
                }
                return Err(e);
            }
        };

        let name = match self.user_repo.find_by_id(user_id).await? {
            Some(u) => u.display_name(),
            None => "Someone".to_string(),
        };
        self.notifications
            .notify(NewNotification::new(
                invite.invited_by,
                NotificationKind::InviteAccepted,
                "Invite accepted",
                format!("{} joined {}", name, group.name),
                json!({ "group_id": group.id, "user_id": user_id }),
            ))
            .await;

        info!("User {} accepted invite {} to group {}", user_id, invite_id, group.id);
        Ok(accepted)
    }

    pub async fn decline(&self, invite_id: Uuid, user_id: Uuid) -> AppResult<GroupInvite> {
        let invite = self.pending_invite(invite_id, user_id).await?;
        let declined = self.respond(&invite, InviteStatus::Declined).await?;
        info!("User {} declined invite {}", user_id, invite_id);
        Ok(declined)
    }
}
