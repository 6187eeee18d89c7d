use super::extract::{ApiJson, ApiPath, ApiQuery};
use crate::auth::CurrentUser;
use crate::error::AppResult;
use crate::services::payment_service::{
    CreatePaymentRequest, ListPaymentsQuery, StatsQuery, UpdatePaymentRequest,
};
use crate::AppState;
use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use serde_json::{json, Value};
use uuid::Uuid;

pub async fn list(
    State(state): State<AppState>,
    current: CurrentUser,
    ApiQuery(query): ApiQuery<ListPaymentsQuery>,
) -> AppResult<Json<Value>> {
    let payments = state.payment_service.list(current.id, &query).await?;
    Ok(Json(json!({ "success": true, "payments": payments })))
}

pub async fn create(
    State(state): State<AppState>,
    current: CurrentUser,
    ApiJson(req): ApiJson<CreatePaymentRequest>,
) -> AppResult<(StatusCode, Json<Value>)> {
    let payment = state.payment_service.create(current.id, &req).await?;
    Ok((StatusCode::CREATED, Json(json!({ "success": true, "payment": payment }))))
}

pub async fn update(
    State(state): State<AppState>,
    current: CurrentUser,
    ApiPath(id): ApiPath<Uuid>,
    ApiJson(req): ApiJson<UpdatePaymentRequest>,
) -> AppResult<Json<Value>> {
    let payment = state.payment_service.update(current.id, id, &req).await?;
    Ok(Json(json!({ "success": true, "payment": payment })))
}

pub async fn delete(
    State(state): State<AppState>,
    current: CurrentUser,
    ApiPath(id): ApiPath<Uuid>,
) -> AppResult<Json<Value>> {
    state.payment_service.delete(current.id, id).await?;
    Ok(Json(json!({ "success": true })))
}

pub async fn stats(
    State(state): State<AppState>,
    current: CurrentUser,
    ApiQuery(query): ApiQuery<StatsQuery>,
) -> AppResult<Json<Value>> {
    let stats = state.payment_service.stats(current.id, &query).await?;
    Ok(Json(json!({ "success": true, "stats": stats })))
}
