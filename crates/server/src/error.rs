use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use orchestrator::TaskResponse;

/// Failures that happen before a submission reaches the orchestrator.
/// They answer 200 with an `error` body like every other task failure.
#[derive(Debug)]
pub enum AppError {
    MalformedRequest(String),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let message = match self {
            AppError::MalformedRequest(detail) => {
                tracing::warn!("Malformed task submission: {}", detail);
                format!("Malformed request: {}", detail)
            }
        };

        (StatusCode::OK, Json(TaskResponse::error(message))).into_response()
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        AppError::MalformedRequest(rejection.body_text())
    }
}
