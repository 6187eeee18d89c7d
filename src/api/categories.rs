use super::extract::{ApiJson, ApiPath, ApiQuery};
use crate::auth::CurrentUser;
use crate::error::AppResult;
use crate::services::category_service::{CreateCategoryRequest, UpdateCategoryRequest};
use crate::AppState;
use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use serde::Deserialize;
use serde_json::{json, Value};
use uuid::Uuid;

#[derive(Debug, Default, Deserialize)]
pub struct CategoryQuery {
    #[serde(rename = "type")]
    pub category_type: Option<String>,
}

pub async fn list(
    State(state): State<AppState>,
    current: CurrentUser,
    ApiQuery(query): ApiQuery<CategoryQuery>,
) -> AppResult<Json<Value>> {
    let categories = state
        .category_service
        .list(current.id, query.category_type.as_deref())
        .await?;
    Ok(Json(json!({ "success": true, "categories": categories })))
}

pub async fn create(
    State(state): State<AppState>,
    current: CurrentUser,
    ApiJson(req): ApiJson<CreateCategoryRequest>,
) -> AppResult<(StatusCode, Json<Value>)> {
    let category = state.category_service.create(current.id, &req).await?;
    Ok((StatusCode::CREATED, Json(json!({ "success": true, "category": category }))))
}

pub async fn update(
    State(state): State<AppState>,
    current: CurrentUser,
    ApiPath(id): ApiPath<Uuid>,
    ApiJson(req): ApiJson<UpdateCategoryRequest>,
) -> AppResult<Json<Value>> {
    let category = state.category_service.update(current.id, id, &req).await?;
    Ok(Json(json!({ "success": true, "category": category })))
}

pub async fn delete(
    State(state): State<AppState>,
    current: CurrentUser,
    ApiPath(id): ApiPath<Uuid>,
) -> AppResult<Json<Value>> {
    state.category_service.delete(current.id, id).await?;
    Ok(Json(json!({ "success": true })))
}
