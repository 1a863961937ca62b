use axum::{response::IntoResponse, Extension, Json};

use crate::errors::AppResult;
use crate::middleware::AuthContext;
use crate::models::{ProfileResponse, PublicProfile};

pub const WELCOME_MESSAGE: &str = "Welcome to PlayerOne API! Use Auth0 for authentication.";

pub async fn home() -> &'static str {
    WELCOME_MESSAGE
}

pub async fn profile(Extension(auth): Extension<AuthContext>) -> AppResult<impl IntoResponse> {
    let user = auth.require_user()?;
    tracing::debug!("Serving profile for {}", user.sub);

    Ok(Json(ProfileResponse {
        message: "Profile data retrieved successfully",
        user: PublicProfile::from(user),
    }))
}
