use crate::error::{AppError, AppResult};
use crate::models::{NewNotification, Notification};
use crate::repositories::NotificationRepository;
use crate::validation;
use serde::Deserialize;
use std::sync::Arc;
use tracing::{error, info};
use uuid::Uuid;

pub const DEFAULT_LIMIT: i64 = 50;
pub const MAX_LIMIT: i64 = 100;

#[derive(Debug, Default, Deserialize)]
pub struct ListNotificationsQuery {
    #[serde(default)]
    pub unread_only: bool,
    pub limit: Option<i64>,
}

#[derive(Debug, Default, Deserialize)]
pub struct MarkReadRequest {
    pub ids: Option<Vec<Uuid>>,
    #[serde(default)]
    pub mark_all: bool,
}

/// Writes and reads in-app notifications
pub struct NotificationService {
    notification_repo: Arc<NotificationRepository>,
}

impl NotificationService {
    pub fn new(notification_repo: Arc<NotificationRepository>) -> Self {
        Self { notification_repo }
    }

    /// Best-effort delivery: failures are logged and never surface to the caller
    pub async fn notify(&self, notification: NewNotification) {
        let user_id = notification.user_id;
        let kind = notification.kind.as_str();
        if let Err(e) = self.notification_repo.create(&notification).await {
            error!("Failed to create {} notification for {}: {}", kind, user_id, e);
        }
    }

    pub async fn notify_all(&self, notifications: Vec<NewNotification>) {
        for notification in notifications {
            self.notify(notification).await;
        }
    }

    /// Newest notifications plus the unread count
    pub async fn list(
        &self,
        user_id: Uuid,
        query: &ListNotificationsQuery,
    ) -> AppResult<(Vec<Notification>, i64)> {
        let limit = validation::limit(query.limit, DEFAULT_LIMIT, MAX_LIMIT);
        let notifications = self
            .notification_repo
            .find_by_user(user_id, query.unread_only, limit)
            .await?;
        let unread = self.notification_repo.count_unread(user_id).await?;

        Ok((notifications, unread))
    }

    /// Returns how many notifications changed
    pub async fn mark_read(&self, user_id: Uuid, request: &MarkReadRequest) -> AppResult<u64> {
        let updated = if request.mark_all {
            self.notification_repo.mark_all_read(user_id).await?
        } else {
            match request.ids.as_deref() {
                Some(ids) if !ids.is_empty() => self.notification_repo.mark_read(user_id, ids).await?,
                _ => {
                    return Err(AppError::Validation(
                        "Provide notification ids or mark_all".to_string(),
                    ))
                }
            }
        };

        info!("Marked {} notifications read for {}", updated, user_id);
        Ok(updated)
    }
}
