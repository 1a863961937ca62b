use axum::{
    body::{to_bytes, Body},
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    Extension, Json,
};

use crate::errors::{AppError, AppResult};
use crate::middleware::AuthContext;
use crate::models::{CreateTaskRequest, TaskCreated};
use crate::state::AppState;

pub const MAX_BODY_BYTES: usize = 100 * 1024;

// The body stays unread until the caller is known to be authenticated.
pub async fn create_task(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    body: Body,
) -> AppResult<Response> {
    if !auth.is_authenticated() {
        tracing::debug!("Rejecting task creation from anonymous caller");
    }
    let user = auth.require_user()?;

    let body = to_bytes(body, MAX_BODY_BYTES).await.map_err(|e| {
        tracing::debug!("Rejecting task body from {}: {}", user.sub, e);
        AppError::PayloadTooLarge(MAX_BODY_BYTES)
    })?;

    let request = CreateTaskRequest::from_body(&body).map_err(|e| {
        tracing::debug!("Rejecting malformed task body: {}", e);
        AppError::BadRequest(format!("Malformed JSON body: {}", e))
    })?;

    let task = request.into_new_task(&user.sub);
    let task_id = state.tasks.insert_task(&task).await.map_err(|e| {
        tracing::error!("Failed to insert task for {}: {}", user.sub, e);
        AppError::Database(e)
    })?;

    tracing::info!("Created task {} for {}", task_id, user.sub);
    Ok((
        StatusCode::CREATED,
        Json(TaskCreated {
            message: "Task created successfully",
            task_id,
        }),
    )
        .into_response())
}
