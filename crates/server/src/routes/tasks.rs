use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::Json;
use orchestrator::TaskResponse;
use serde_json::Value;
use taskpub_core::TaskSubmission;
use tracing::Instrument;
use uuid::Uuid;

use crate::error::AppError;
use crate::state::AppState;

/// Every outcome, including rejected and failed tasks, answers 200. The
/// body is only parsed as JSON here so that the secret is checked before
/// any field types.
#[utoipa::path(
    post,
    path = "/handle_task",
    request_body = TaskSubmission,
    responses(
        (status = 200, description = "Round summary or error payload", body = TaskResponse)
    ),
    tag = "tasks"
)]
pub async fn handle_task(
    State(state): State<AppState>,
    payload: Result<Json<Value>, JsonRejection>,
) -> Result<Json<TaskResponse>, AppError> {
    let Json(body) = payload?;

    let span = tracing::info_span!(
        "task",
        request_id = %Uuid::new_v4(),
        task = body.get("task").and_then(serde_json::Value::as_str).unwrap_or("-"),
        round = %body
            .get("round")
            .map(|r| r.to_string())
            .unwrap_or_else(|| "-".to_string()),
    );

    let response = state.orchestrator.handle_json(body).instrument(span).await;
    Ok(Json(response))
}
