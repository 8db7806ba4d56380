use axum::{
    body::Body,
    extract::{Path, Request, State},
    response::{IntoResponse, Response},
    Json,
};
use crate::state::AppState;
use crate::api::dtos::requests::CheckResultRequest;
use crate::error::AppError;
use std::sync::Arc;
use tower::ServiceExt;
use tower_http::services::ServeFile;

/// Always answers 200; the outcome is carried in `status`.
pub async fn check_result(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<CheckResultRequest>,
) -> impl IntoResponse {
    Json(state.lookup_service.check_result(&payload.pin, &payload.identifier).await)
}

/// Serves a result file only while its order is published.
pub async fn serve_result_file(
    State(state): State<Arc<AppState>>,
    Path(file_name): Path<String>,
    request: Request,
) -> Result<Response, AppError> {
    if !state.order_repo.is_published_file(&file_name).await? {
        return Err(AppError::NotFound("Result file not found".into()));
    }

    let response = ServeFile::new(state.config.results_dir.join(&file_name))
        .oneshot(request)
        .await
        .unwrap_or_else(|never| match never {});
    Ok(response.map(Body::new))
}
