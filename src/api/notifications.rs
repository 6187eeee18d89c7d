use super::extract::{ApiJson, ApiQuery};
use crate::auth::CurrentUser;
use crate::error::AppResult;
use crate::services::notification_service::{ListNotificationsQuery, MarkReadRequest};
use crate::AppState;
use axum::extract::State;
use axum::Json;
use serde_json::{json, Value};

pub async fn list(
    State(state): State<AppState>,
    current: CurrentUser,
    ApiQuery(query): ApiQuery<ListNotificationsQuery>,
) -> AppResult<Json<Value>> {
    let (notifications, unread) = state.notification_service.list(current.id, &query).await?;
    Ok(Json(json!({
        "success": true,
        "notifications": notifications,
        "unread_count": unread,
    })))
}

pub async fn mark_read(
    State(state): State<AppState>,
    current: CurrentUser,
    ApiJson(req): ApiJson<MarkReadRequest>,
) -> AppResult<Json<Value>> {
    let updated = state.notification_service.mark_read(current.id, &req).await?;
    Ok(Json(json!({ "success": true, "updated": updated })))
}
