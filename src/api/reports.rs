use super::extract::ApiJson;
use crate::auth::CurrentUser;
use crate::error::AppResult;
use crate::services::report_service::GenerateReportRequest;
use crate::AppState;
use axum::extract::State;
use axum::http::header;
use axum::response::{IntoResponse, Response};

/// Render the report and stream it back as a download
pub async fn generate(
    State(state): State<AppState>,
    current: CurrentUser,
    ApiJson(req): ApiJson<GenerateReportRequest>,
) -> AppResult<Response> {
    let file = state.report_service.generate(current.id, &req).await?;

    let disposition = format!("attachment; filename=\"{}\"", file.filename);
    Ok((
        [
            (header::CONTENT_TYPE, file.content_type.to_string()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        file.bytes,
    )
        .into_response())
}
