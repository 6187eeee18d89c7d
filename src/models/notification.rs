use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sqlx::FromRow;
use uuid::Uuid;

/// What triggered a notification
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationKind {
    GroupInvite,
    InviteAccepted,
    ExpenseAdded,
    PaymentReminder,
    SettlementRequest,
    SettlementApproved,
    SettlementRejected,
    ExpenseSettled,
}

impl NotificationKind {
    /// Convert to database string
    pub fn as_str(&self) -> &'static str {
        match self {
            NotificationKind::GroupInvite => "group_invite",
            NotificationKind::InviteAccepted => "invite_accepted",
            NotificationKind::ExpenseAdded => "expense_added",
            NotificationKind::PaymentReminder => "payment_reminder",
            NotificationKind::SettlementRequest => "settlement_request",
            NotificationKind::SettlementApproved => "settlement_approved",
            NotificationKind::SettlementRejected => "settlement_rejected",
            NotificationKind::ExpenseSettled => "expense_settled",
        }
    }
}

/// In-app notification
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Notification {
    pub id: Uuid,
    pub user_id: Uuid,
    pub kind: String,
    pub title: String,
    pub message: String,
    pub data: Value, // JSONB
    pub is_read: bool,
    pub created_at: NaiveDateTime,
}

/// Notification waiting to be written
#[derive(Debug, Clone)]
pub struct NewNotification {
    pub user_id: Uuid,
    pub kind: NotificationKind,
    pub title: String,
    pub message: String,
    pub data: Value,
}

impl NewNotification {
    pub fn new(
        user_id: Uuid,
        kind: NotificationKind,
        title: impl Into<String>,
        message: impl Into<String>,
        data: Value,
    ) -> Self {
        Self {
            user_id,
            kind,
            title: title.into(),
            message: message.into(),
            data,
        }
    }
}
