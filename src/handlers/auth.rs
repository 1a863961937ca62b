use axum::{
    extract::{Query, State},
    response::{IntoResponse, Redirect, Response},
};
use tower_sessions::Session;

use crate::errors::{AppError, AppResult};
use crate::middleware::auth::{PENDING_LOGIN_KEY, SESSION_USER_KEY};
use crate::models::{CallbackQuery, LoginQuery, SessionUser};
use crate::services::PendingLogin;
use crate::state::AppState;

pub async fn login(
    State(state): State<AppState>,
    session: Session,
    Query(query): Query<LoginQuery>,
) -> AppResult<Response> {
    if matches!(state.sessions.is_authenticated(&session).await, Ok(true)) {
        tracing::info!("Authenticated session is starting a new login");
    }

    let (authorize_url, pending) = state.oidc.authorize(query.return_to.as_deref());
    session.insert(PENDING_LOGIN_KEY, &pending).await?;

    tracing::info!("Redirecting to identity provider, return path {}", pending.return_to);
    Ok(Redirect::to(authorize_url.as_str()).into_response())
}

pub async fn callback(
    State(state): State<AppState>,
    session: Session,
    Query(query): Query<CallbackQuery>,
) -> AppResult<Response> {
    // Consumed up front so a pending login can only be used once.
    let pending = session
        .remove::<PendingLogin>(PENDING_LOGIN_KEY)
        .await?
        .ok_or_else(|| AppError::BadRequest("No login in progress".into()))?;

    if let Some(error) = query.error {
        let detail = query.error_description.unwrap_or(error);
        tracing::warn!("Identity provider refused login: {}", detail);
        return Err(AppError::BadRequest(format!("Login failed: {}", detail)));
    }

    if query.state.as_deref() != Some(pending.csrf_state.as_str()) {
        tracing::warn!("Login callback state mismatch");
        return Err(AppError::BadRequest("Invalid login state".into()));
    }

    tracing::debug!("Completing login for nonce {}", pending.nonce);

    let code = query
        .code
        .ok_or_else(|| AppError::BadRequest("Missing authorization code".into()))?;

    let access_token = state.oidc.exchange_code(&code, &pending.pkce_verifier).await?;
    let user = state.oidc.fetch_user(&access_token).await?;

    // New session id on privilege change.
    session.cycle_id().await?;
    session
        .insert(SESSION_USER_KEY, SessionUser::new(user.clone()))
        .await?;

    tracing::info!("User {} logged in", user.sub);
    Ok(Redirect::to(&pending.return_to).into_response())
}

pub async fn logout(State(state): State<AppState>, session: Session) -> AppResult<Response> {
    if let Ok(Some(stored)) = session.get::<SessionUser>(SESSION_USER_KEY).await {
        tracing::info!("User {} logged out", stored.user.sub);
    }
    session.flush().await?;

    Ok(Redirect::to(state.oidc.logout_url().as_str()).into_response())
}
