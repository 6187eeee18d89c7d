use super::extract::{ApiJson, ApiPath, ApiQuery};
use crate::auth::CurrentUser;
use crate::error::AppResult;
use crate::services::upi_service::{CreateUpiRequest, QrQuery, UpdateUpiRequest};
use crate::AppState;
use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use serde_json::{json, Value};
use uuid::Uuid;

pub async fn list(State(state): State<AppState>, current: CurrentUser) -> AppResult<Json<Value>> {
    let upi_ids = state.upi_service.list(current.id).await?;
    Ok(Json(json!({ "success": true, "upi_ids": upi_ids })))
}

pub async fn create(
    State(state): State<AppState>,
    current: CurrentUser,
    ApiJson(req): ApiJson<CreateUpiRequest>,
) -> AppResult<(StatusCode, Json<Value>)> {
    let upi = state.upi_service.create(current.id, &req).await?;
    Ok((StatusCode::CREATED, Json(json!({ "success": true, "upi_id": upi }))))
}

pub async fn update(
    State(state): State<AppState>,
    current: CurrentUser,
    ApiPath(id): ApiPath<Uuid>,
    ApiJson(req): ApiJson<UpdateUpiRequest>,
) -> AppResult<Json<Value>> {
    let upi = state.upi_service.update(current.id, id, &req).await?;
    Ok(Json(json!({ "success": true, "upi_id": upi })))
}

pub async fn delete(
    State(state): State<AppState>,
    current: CurrentUser,
    ApiPath(id): ApiPath<Uuid>,
) -> AppResult<Json<Value>> {
    state.upi_service.delete(current.id, id).await?;
    Ok(Json(json!({ "success": true })))
}

pub async fn qr(
    State(state): State<AppState>,
    current: CurrentUser,
    ApiPath(id): ApiPath<Uuid>,
    ApiQuery(query): ApiQuery<QrQuery>,
) -> AppResult<Json<Value>> {
    let qr = state.upi_service.qr(current.id, id, &query).await?;
    Ok(Json(json!({
        "success": true,
        "upi_link": qr.upi_link,
        "qr_code": qr.qr_code,
    })))
}
