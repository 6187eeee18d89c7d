//! Settlement endpoints for expenses and individual splits

use super::extract::ApiPath;
use crate::auth::CurrentUser;
use crate::error::AppResult;
use crate::AppState;
use axum::extract::State;
use axum::Json;
use serde_json::{json, Value};
use uuid::Uuid;

pub async fn remind(
    State(state): State<AppState>,
    current: CurrentUser,
    ApiPath(id): ApiPath<Uuid>,
) -> AppResult<Json<Value>> {
    let reminded = state.settlement_service.remind(id, current.id).await?;
    Ok(Json(json!({ "success": true, "reminded": reminded })))
}

pub async fn settle(
    State(state): State<AppState>,
    current: CurrentUser,
    ApiPath(id): ApiPath<Uuid>,
) -> AppResult<Json<Value>> {
    let expense = state.settlement_service.settle_expense(id, current.id).await?;
    Ok(Json(json!({ "success": true, "expense": expense })))
}

pub async fn request_approval(
    State(state): State<AppState>,
    current: CurrentUser,
    ApiPath(id): ApiPath<Uuid>,
) -> AppResult<Json<Value>> {
    let split = state.settlement_service.request_approval(id, current.id).await?;
    Ok(Json(json!({ "success": true, "split": split })))
}

pub async fn approve(
    State(state): State<AppState>,
    current: CurrentUser,
    ApiPath(id): ApiPath<Uuid>,
) -> AppResult<Json<Value>> {
    let split = state.settlement_service.approve(id, current.id).await?;
    Ok(Json(json!({ "success": true, "split": split })))
}

pub async fn reject(
    State(state): State<AppState>,
    current: CurrentUser,
    ApiPath(id): ApiPath<Uuid>,
) -> AppResult<Json<Value>> {
    let split = state.settlement_service.reject(id, current.id).await?;
    Ok(Json(json!({ "success": true, "split": split })))
}
