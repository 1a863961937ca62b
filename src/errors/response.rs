use axum::{
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

use crate::errors::{AppError, RATE_LIMITED_MESSAGE, UNAUTHENTICATED_MESSAGE};

pub const RATE_LIMIT_LIMIT_HEADER: &str = "x-ratelimit-limit";
pub const RATE_LIMIT_REMAINING_HEADER: &str = "x-ratelimit-remaining";

// The IntoResponse implementation turns every AppError into the JSON error
// shape `{"error": "..."}`, except rate limiting which answers in plain text.
impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        match self {
            AppError::Unauthenticated => {
                error_body(StatusCode::UNAUTHORIZED, UNAUTHENTICATED_MESSAGE.to_string())
            }

            AppError::RateLimited { limit, retry_after } => {
                let mut response =
                    (StatusCode::TOO_MANY_REQUESTS, RATE_LIMITED_MESSAGE).into_response();
                let headers = response.headers_mut();
                // Round up so clients never retry inside the current window.
                let retry_secs = retry_after.as_secs() + u64::from(retry_after.subsec_nanos() > 0);
                headers.insert(header::RETRY_AFTER, HeaderValue::from(retry_secs));
                headers.insert(RATE_LIMIT_LIMIT_HEADER, HeaderValue::from(limit));
                headers.insert(RATE_LIMIT_REMAINING_HEADER, HeaderValue::from(0u32));
                response
            }

            AppError::Database(e) => {
                tracing::error!("Database error: {}", e);
                error_body(StatusCode::INTERNAL_SERVER_ERROR, driver_message(&e))
            }

            AppError::Session(e) => {
                tracing::error!("Session error: {}", e);
                error_body(StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
            }

            AppError::Provider(msg) => {
                tracing::error!("Identity provider error: {}", msg);
                error_body(StatusCode::BAD_GATEWAY, msg)
            }

            AppError::BadRequest(msg) => error_body(StatusCode::BAD_REQUEST, msg),

            e @ AppError::PayloadTooLarge(_) => {
                error_body(StatusCode::PAYLOAD_TOO_LARGE, e.to_string())
            }
        }
    }
}

fn error_body(status: StatusCode, message: String) -> Response {
    (status, Json(json!({ "error": message }))).into_response()
}

// Server-side failures carry the MySQL message itself (e.g. "Field 'title'
// doesn't have a default value"); everything else uses the driver's display.
fn driver_message(err: &sqlx::Error) -> String {
    match err {
        sqlx::Error::Database(db_err) => db_err.message().to_string(),
        other => other.to_string(),
    }
}
