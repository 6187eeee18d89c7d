use super::extract::{ApiJson, ApiPath, ApiQuery};
use crate::auth::CurrentUser;
use crate::error::AppResult;
use crate::services::expense_service::CreateExpenseRequest;
use crate::services::group_service::{
    CreateGroupRequest, InviteRequest, LeaveOutcome, ListMessagesQuery, PostMessageRequest,
    UpdateGroupRequest,
};
use crate::AppState;
use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use serde_json::{json, Value};
use uuid::Uuid;

// =============================================================================
// Groups
// =============================================================================

pub async fn list(State(state): State<AppState>, current: CurrentUser) -> AppResult<Json<Value>> {
    let groups = state.group_service.list(current.id).await?;
    Ok(Json(json!({ "success": true, "groups": groups })))
}

pub async fn create(
    State(state): State<AppState>,
    current: CurrentUser,
    ApiJson(req): ApiJson<CreateGroupRequest>,
) -> AppResult<(StatusCode, Json<Value>)> {
    let group = state.group_service.create(current.id, &req).await?;
    Ok((StatusCode::CREATED, Json(json!({ "success": true, "group": group }))))
}

pub async fn get(
    State(state): State<AppState>,
    current: CurrentUser,
    ApiPath(id): ApiPath<Uuid>,
) -> AppResult<Json<Value>> {
    let group = state.group_service.get(id, current.id).await?;
    Ok(Json(json!({ "success": true, "group": group })))
}

pub async fn update(
    State(state): State<AppState>,
    current: CurrentUser,
    ApiPath(id): ApiPath<Uuid>,
    ApiJson(req): ApiJson<UpdateGroupRequest>,
) -> AppResult<Json<Value>> {
    let group = state.group_service.update(id, current.id, &req).await?;
    Ok(Json(json!({ "success": true, "group": group })))
}

pub async fn delete(
    State(state): State<AppState>,
    current: CurrentUser,
    ApiPath(id): ApiPath<Uuid>,
) -> AppResult<Json<Value>> {
    state.group_service.delete(id, current.id).await?;
    Ok(Json(json!({ "success": true })))
}

// =============================================================================
// Membership
// =============================================================================

pub async fn members(
    State(state): State<AppState>,
    current: CurrentUser,
    ApiPath(id): ApiPath<Uuid>,
) -> AppResult<Json<Value>> {
    let members = state.group_service.members(id, current.id).await?;
    Ok(Json(json!({ "success": true, "members": members })))
}

pub async fn remove_member(
    State(state): State<AppState>,
    current: CurrentUser,
    ApiPath((id, user_id)): ApiPath<(Uuid, Uuid)>,
) -> AppResult<Json<Value>> {
    state.group_service.remove_member(id, current.id, user_id).await?;
    Ok(Json(json!({ "success": true })))
}

pub async fn invite(
    State(state): State<AppState>,
    current: CurrentUser,
    ApiPath(id): ApiPath<Uuid>,
    ApiJson(req): ApiJson<InviteRequest>,
) -> AppResult<(StatusCode, Json<Value>)> {
    let invite = state.group_service.invite(id, current.id, &req).await?;
    Ok((StatusCode::CREATED, Json(json!({ "success": true, "invite": invite }))))
}

pub async fn leave(
    State(state): State<AppState>,
    current: CurrentUser,
    ApiPath(id): ApiPath<Uuid>,
) -> AppResult<Json<Value>> {
    let body = match state.group_service.leave(id, current.id).await? {
        LeaveOutcome::Left => json!({ "success": true, "group_deleted": false }),
        LeaveOutcome::LeftAndPromoted { promoted } => {
            json!({ "success": true, "group_deleted": false, "promoted_admin": promoted })
        }
        LeaveOutcome::GroupDeleted => json!({ "success": true, "group_deleted": true }),
    };
    Ok(Json(body))
}

// =============================================================================
// Chat
// =============================================================================

pub async fn messages(
    State(state): State<AppState>,
    current: CurrentUser,
    ApiPath(id): ApiPath<Uuid>,
    ApiQuery(query): ApiQuery<ListMessagesQuery>,
) -> AppResult<Json<Value>> {
    let messages = state.group_service.messages(id, current.id, &query).await?;
    Ok(Json(json!({ "success": true, "messages": messages })))
}

pub async fn post_message(
    State(state): State<AppState>,
    current: CurrentUser,
    ApiPath(id): ApiPath<Uuid>,
    ApiJson(req): ApiJson<PostMessageRequest>,
) -> AppResult<(StatusCode, Json<Value>)> {
    let message = state.group_service.post_message(id, current.id, &req).await?;
    Ok((StatusCode::CREATED, Json(json!({ "success": true, "message": message }))))
}

// =============================================================================
// Expenses
// =============================================================================

pub async fn expenses(
    State(state): State<AppState>,
    current: CurrentUser,
    ApiPath(id): ApiPath<Uuid>,
) -> AppResult<Json<Value>> {
    let expenses = state.expense_service.list(id, current.id).await?;
    Ok(Json(json!({ "success": true, "expenses": expenses })))
}

pub async fn create_expense(
    State(state): State<AppState>,
    current: CurrentUser,
    ApiPath(id): ApiPath<Uuid>,
    ApiJson(req): ApiJson<CreateExpenseRequest>,
) -> AppResult<(StatusCode, Json<Value>)> {
    let expense = state.expense_service.create(id, current.id, &req).await?;
    Ok((StatusCode::CREATED, Json(json!({ "success": true, "expense": expense }))))
}
