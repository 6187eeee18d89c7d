use crate::error::AppResult;
use crate::AppState;
use axum::extract::State;
use axum::Json;
use serde_json::{json, Value};

/// Liveness plus a database round trip
pub async fn health(State(state): State<AppState>) -> AppResult<Json<Value>> {
    state.database.ping().await?;
    Ok(Json(json!({ "success": true, "status": "ok" })))
}
