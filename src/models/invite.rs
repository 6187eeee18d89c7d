use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Invite lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InviteStatus {
    Pending,
    Accepted,
    Declined,
}

impl InviteStatus {
    /// Convert from database string
    pub fn from_str(s: &str) -> Result<Self, String> {
        match s.to_lowercase().as_str() {
            "pending" => Ok(InviteStatus::Pending),
            "accepted" => Ok(InviteStatus::Accepted),
            "declined" => Ok(InviteStatus::Declined),
            _ => Err(format!("Invalid invite status: {}", s)),
        }
    }

    /// Convert to database string
    pub fn as_str(&self) -> &'static str {
        match self {
            InviteStatus::Pending => "pending",
            InviteStatus::Accepted => "accepted",
            InviteStatus::Declined => "declined",
        }
    }
}

/// Invitation for a user to join a group
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct GroupInvite {
    pub id: Uuid,
    pub group_id: Uuid,
    pub invited_by: Uuid,
    pub invited_user: Uuid,
    pub status: String,
    pub created_at: NaiveDateTime,
    pub responded_at: Option<NaiveDateTime>,
}

impl GroupInvite {
    pub fn status_enum(&self) -> InviteStatus {
        InviteStatus::from_str(&self.status).unwrap_or(InviteStatus::Pending)
    }

    pub fn is_pending(&self) -> bool {
        self.status_enum() == InviteStatus::Pending
    }
}

/// Pending invite as shown to the invitee
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct InviteView {
    pub id: Uuid,
    pub group_id: Uuid,
    pub group_name: String,
    pub invited_by: Uuid,
    pub inviter_username: Option<String>,
    pub created_at: NaiveDateTime,
}
