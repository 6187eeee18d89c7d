use super::extract::ApiJson;
use crate::auth::CurrentUser;
use crate::error::AppResult;
use crate::services::preferences_service::UpdatePreferencesRequest;
use crate::AppState;
use axum::extract::State;
use axum::Json;
use serde_json::{json, Value};

pub async fn get(State(state): State<AppState>, current: CurrentUser) -> AppResult<Json<Value>> {
    let preferences = state.preferences_service.get(current.id).await?;
    Ok(Json(json!({ "success": true, "preferences": preferences })))
}

pub async fn update(
    State(state): State<AppState>,
    current: CurrentUser,
    ApiJson(req): ApiJson<UpdatePreferencesRequest>,
) -> AppResult<Json<Value>> {
    let preferences = state.preferences_service.update(current.id, &req).await?;
    Ok(Json(json!({ "success": true, "preferences": preferences })))
}
