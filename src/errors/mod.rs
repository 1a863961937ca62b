use std::time::Duration;

use thiserror::Error;

pub mod response;

pub const UNAUTHENTICATED_MESSAGE: &str = "User not authenticated";
pub const RATE_LIMITED_MESSAGE: &str = "Too many requests, please try again later.";

#[derive(Error, Debug)]
pub enum AppError {
    #[error("{}", UNAUTHENTICATED_MESSAGE)]
    Unauthenticated,

    #[error("{}", RATE_LIMITED_MESSAGE)]
    RateLimited { limit: u32, retry_after: Duration },

    // Driver errors are surfaced to the caller as-is; see response.rs.
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Session error: {0}")]
    Session(#[from] tower_sessions::session::Error),

    #[error("Identity provider error: {0}")]
    Provider(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Request body exceeds {0} bytes")]
    PayloadTooLarge(usize),
}

pub type AppResult<T> = Result<T, AppError>;
