use crate::error::{AppError, AppResult};
use crate::models::{
    Group, GroupInvite, GroupMember, GroupMessage, GroupSummary, MemberProfile, MemberRole,
    NewNotification, NotificationKind,
};
use crate::repositories::{
    GroupMemberRepository, GroupRepository, InviteRepository, MessageRepository, UserRepository,
};
use crate::services::NotificationService;
use crate::validation;
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::sync::Arc;
use tracing::{error, info};
use uuid::Uuid;

const MAX_GROUP_NAME: usize = 100;
const MAX_GROUP_DESCRIPTION: usize = 500;
pub const MAX_MESSAGE_LEN: usize = 1000;
pub const DEFAULT_MESSAGE_LIMIT: i64 = 50;
pub const MAX_MESSAGE_LIMIT: i64 = 100;

#[derive(Debug, Deserialize)]
pub struct CreateGroupRequest {
    pub name: String,
    pub description: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct UpdateGroupRequest {
    pub name: Option<String>,
    pub description: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct InviteRequest {
    pub username: Option<String>,
    pub email: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct ListMessagesQuery {
    pub limit: Option<i64>,
    pub before: Option<NaiveDateTime>,
}

#[derive(Debug, Deserialize)]
pub struct PostMessageRequest {
    pub content: String,
}

/// Group with its member list
#[derive(Debug, Serialize)]
pub struct GroupDetails {
    #[serde(flatten)]
    pub group: Group,
    pub members: Vec<MemberProfile>,
}

/// What happened when a member left
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LeaveOutcome {
    Left,
    /// Caller was the only admin; `promoted` became admin
    LeftAndPromoted { promoted: Uuid },
    /// Caller was the last member and the group is gone
    GroupDeleted,
}

/// Load the caller's membership: 404 if the group is missing, 403 if not a member
pub(crate) async fn require_member(
    group_repo: &GroupRepository,
    member_repo: &GroupMemberRepository,
    group_id: Uuid,
    user_id: Uuid,
) -> AppResult<(Group, GroupMember)> {
    let group = group_repo
        .find_by_id(group_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Group not found".to_string()))?;

    let member = member_repo
        .find_membership(group_id, user_id)
        .await?
        .ok_or_else(|| AppError::Forbidden("You are not a member of this group".to_string()))?;

    Ok((group, member))
}

/// Service for managing groups, membership, invites and chat
pub struct GroupService {
    group_repo: Arc<GroupRepository>,
    user_repo: Arc<UserRepository>,
    member_repo: Arc<GroupMemberRepository>,
    invite_repo: Arc<InviteRepository>,
    message_repo: Arc<MessageRepository>,
    notifications: Arc<NotificationService>,
}

impl GroupService {
    pub fn new(
        group_repo: Arc<GroupRepository>,
        user_repo: Arc<UserRepository>,
        member_repo: Arc<GroupMemberRepository>,
        invite_repo: Arc<InviteRepository>,
        message_repo: Arc<MessageRepository>,
        notifications: Arc<NotificationService>,
    ) -> Self {
        Self {
            group_repo,
            user_repo,
            member_repo,
            invite_repo,
            message_repo,
            notifications,
        }
    }

    async fn member(&self, group_id: Uuid, user_id: Uuid) -> AppResult<(Group, GroupMember)> {
        require_member(&self.group_repo, &self.member_repo, group_id, user_id).await
    }

    async fn admin(&self, group_id: Uuid, user_id: Uuid, action: &str) -> AppResult<Group> {
        let (group, member) = self.member(group_id, user_id).await?;
        if !member.is_admin() {
            return Err(AppError::Forbidden(format!("Only group admins can {}", action)));
        }
        Ok(group)
    }

    // =========================================================================
    // Groups
    // =========================================================================

    pub async fn list(&self, user_id: Uuid) -> AppResult<Vec<GroupSummary>> {
        Ok(self.group_repo.find_for_user(user_id).await?)
    }

    /// Create a group and make the creator its admin.
    ///
    /// Not transactional: if adding the creator fails the group is deleted again.
    pub async fn create(&self, user_id: Uuid, req: &CreateGroupRequest) -> AppResult<Group> {
        let name = validation::sanitize_text(&req.name, MAX_GROUP_NAME, "Group name")?;
        let description =
            validation::optional_text(req.description.as_deref(), MAX_GROUP_DESCRIPTION, "Description")?;

        info!("Creating group: name={}, creator={}", name, user_id);
        let group = self
            .group_repo
            .create(&name, description.as_deref(), user_id)
            .await?;

        if let Err(e) = self
            .member_repo
            .add_member(group.id, user_id, MemberRole::Admin)
            .await
        {
            error!("Failed to add creator to group {}: {}", group.id, e);
            if let Err(cleanup) = self.group_repo.delete(group.id).await {
                error!("Failed to remove orphaned group {}: {}", group.id, cleanup);
            }
            return Err(AppError::from(e));
        }

        info!("Created group {} ({})", group.name, group.id);
        Ok(group)
    }

    pub async fn get(&self, group_id: Uuid, user_id: Uuid) -> AppResult<GroupDetails> {
        let (group, _) = self.member(group_id, user_id).await?;
        let members = self.member_repo.find_by_group(group_id).await?;
        Ok(GroupDetails { group, members })
    }

    pub async fn update(
        &self,
        group_id: Uuid,
        user_id: Uuid,
        req: &UpdateGroupRequest,
    ) -> AppResult<Group> {
        self.admin(group_id, user_id, "edit the group").await?;

        let name = req
            .name
            .as_deref()
            .map(|n| validation::sanitize_text(n, MAX_GROUP_NAME, "Group name"))
            .transpose()?;
        let description =
            validation::optional_text(req.description.as_deref(), MAX_GROUP_DESCRIPTION, "Description")?;

        self.group_repo
            .update(group_id, name.as_deref(), description.as_deref())
            .await?
            .ok_or_else(|| AppError::NotFound("Group not found".to_string()))
    }

    pub async fn delete(&self, group_id: Uuid, user_id: Uuid) -> AppResult<()> {
        self.admin(group_id, user_id, "delete the group").await?;
        self.group_repo.delete(group_id).await?;
        info!("Deleted group {} by {}", group_id, user_id);
        Ok(())
    }

    // =========================================================================
    // Membership
    // =========================================================================

    pub async fn members(&self, group_id: Uuid, user_id: Uuid) -> AppResult<Vec<MemberProfile>> {
        self.member(group_id, user_id).await?;
        Ok(self.member_repo.find_by_group(group_id).await?)
    }

    /// Admin removes another member
    pub async fn remove_member(&self, group_id: Uuid, admin_id: Uuid, target: Uuid) -> AppResult<()> {
        self.admin(group_id, admin_id, "remove members").await?;
        if target == admin_id {
            return Err(AppError::Validation(
                "Use leave to remove yourself from a group".to_string(),
            ));
        }

        if !self.member_repo.remove_member(group_id, target).await? {
            return Err(AppError::NotFound("Member not found".to_string()));
        }
        info!("Removed member {} from group {}", target, group_id);
        Ok(())
    }

    /// Invite a user by username or email
    pub async fn invite(&self, group_id: Uuid, inviter_id: Uuid, req: &InviteRequest) -> AppResult<GroupInvite> {
        let (group, _) = self.member(group_id, inviter_id).await?;

        let invitee = match (req.username.as_deref(), req.email.as_deref()) {
            (Some(username), _) if !username.trim().is_empty() => {
                self.user_repo.find_by_username(&username.trim().to_lowercase()).await?
            }
            (_, Some(email)) if !email.trim().is_empty() => {
                self.user_repo.find_by_email(&email.trim().to_lowercase()).await?
            }
            _ => {
                return Err(AppError::Validation(
                    "Provide a username or email to invite".to_string(),
                ))
            }
        }
        .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;

        if self.member_repo.is_member(group_id, invitee.id).await? {
            return Err(AppError::Conflict("User is already a member of this group".to_string()));
        }
        if self.invite_repo.has_pending(group_id, invitee.id).await? {
            return Err(AppError::Conflict("User already has a pending invite".to_string()));
        }

        let invite = self.invite_repo.create(group_id, inviter_id, invitee.id).await?;

        let inviter_name = match self.user_repo.find_by_id(inviter_id).await? {
            Some(u) => u.display_name(),
            None => "Someone".to_string(),
        };
        self.notifications
            .notify(NewNotification::new(
                invitee.id,
                NotificationKind::GroupInvite,
                "Group invitation",
                format!("{} invited you to join {}", inviter_name, group.name),
                json!({ "group_id": group_id, "invite_id": invite.id, "group_name": group.name }),
            ))
            .await;

        info!("User {} invited {} to group {}", inviter_id, invitee.id, group_id);
        Ok(invite)
    }

    /// Leave a group, handing over admin rights or deleting the group when needed
    pub async fn leave(&self, group_id: Uuid, user_id: Uuid) -> AppResult<LeaveOutcome> {
        let (_, member) = self.member(group_id, user_id).await?;

        let member_count = self.member_repo.count_by_group(group_id).await?;
        if member_count <= 1 {
            self.group_repo.delete(group_id).await?;
            info!("Last member {} left, deleted group {}", user_id, group_id);
            return Ok(LeaveOutcome::GroupDeleted);
        }

        let mut outcome = LeaveOutcome::Left;
        if member.is_admin() && self.member_repo.count_admins(group_id).await? == 1 {
            if let Some(successor) = self.member_repo.find_oldest_other(group_id, user_id).await? {
                self.member_repo
                    .update_role(group_id, successor.user_id, MemberRole::Admin)
                    .await?;
                info!("Promoted {} to admin of group {}", successor.user_id, group_id);
                outcome = LeaveOutcome::LeftAndPromoted {
                    promoted: successor.user_id,
                };
            }
        }

        self.member_repo.remove_member(group_id, user_id).await?;
        info!("User {} left group {}", user_id, group_id);
        Ok(outcome)
    }

    // =========================================================================
    // Chat
    // =========================================================================

    pub async fn messages(
        &self,
        group_id: Uuid,
        user_id: Uuid,
        query: &ListMessagesQuery,
    ) -> AppResult<Vec<GroupMessage>> {
        self.member(group_id, user_id).await?;
        let limit = validation::limit(query.limit, DEFAULT_MESSAGE_LIMIT, MAX_MESSAGE_LIMIT);
        Ok(self.message_repo.find_by_group(group_id, limit, query.before).await?)
    }

    pub async fn post_message(
        &self,
        group_id: Uuid,
        user_id: Uuid,
        req: &PostMessageRequest,
    ) -> AppResult<GroupMessage> {
        self.member(group_id, user_id).await?;
        let content = validation::sanitize_text(&req.content, MAX_MESSAGE_LEN, "Message")?;
        Ok(self.message_repo.create(group_id, user_id, &content).await?)
    }
}
