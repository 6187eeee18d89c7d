use super::extract::ApiPath;
use crate::auth::CurrentUser;
use crate::error::AppResult;
use crate::AppState;
use axum::extract::State;
use axum::Json;
use serde_json::{json, Value};
use uuid::Uuid;

pub async fn pending(State(state): State<AppState>, current: CurrentUser) -> AppResult<Json<Value>> {
    let invites = state.invite_service.pending(current.id).await?;
    Ok(Json(json!({ "success": true, "invites": invites })))
}

pub async fn accept(
    State(state): State<AppState>,
    current: CurrentUser,
    ApiPath(id): ApiPath<Uuid>,
) -> AppResult<Json<Value>> {
    let invite = state.invite_service.accept(id, current.id).await?;
    Ok(Json(json!({ "success": true, "invite": invite })))
}

pub async fn decline(
    State(state): State<AppState>,
    current: CurrentUser,
    ApiPath(id): ApiPath<Uuid>,
) -> AppResult<Json<Value>> {
    let invite = state.invite_service.decline(id, current.id).await?;
    Ok(Json(json!({ "success": true, "invite": invite })))
}
