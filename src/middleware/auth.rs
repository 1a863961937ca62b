use async_trait::async_trait;
use axum::{
    body::Body,
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use chrono::Utc;
use tower_sessions::Session;

use crate::errors::{AppError, AppResult};
use crate::models::{AuthenticatedUser, SessionUser};
use crate::state::AppState;

pub const SESSION_USER_KEY: &str = "oidc.user";
pub const PENDING_LOGIN_KEY: &str = "oidc.pending_login";

/// Decides who, if anyone, a session belongs to.
#[async_trait]
pub trait SessionValidator: Send + Sync {
    async fn current_user(&self, session: &Session) -> AppResult<Option<AuthenticatedUser>>;

    async fn is_authenticated(&self, session: &Session) -> AppResult<bool> {
        Ok(self.current_user(session).await?.is_some())
    }
}

/// Trusts whatever user the login callback stored, within the absolute
/// session lifetime.
#[derive(Debug, Default)]
pub struct OidcSessionValidator;

#[async_trait]
impl SessionValidator for OidcSessionValidator {
    async fn current_user(&self, session: &Session) -> AppResult<Option<AuthenticatedUser>> {
        let Some(stored) = session.get::<SessionUser>(SESSION_USER_KEY).await? else {
            return Ok(None);
        };

        if stored.is_expired_at(Utc::now()) {
            tracing::info!("Session for {} has expired", stored.user.sub);
            return Ok(None);
        }

        Ok(Some(stored.user))
    }
}

/// Per-request view of the caller's authentication state.
#[derive(Debug, Clone, Default)]
pub struct AuthContext {
    user: Option<AuthenticatedUser>,
}

impl AuthContext {
    pub fn new(user: Option<AuthenticatedUser>) -> Self {
        Self { user }
    }

    pub fn is_authenticated(&self) -> bool {
        self.user.is_some()
    }

    pub fn user(&self) -> Option<&AuthenticatedUser> {
        self.user.as_ref()
    }

    pub fn require_user(&self) -> AppResult<&AuthenticatedUser> {
        self.user().ok_or(AppError::Unauthenticated)
    }
}

pub async fn attach_auth_context(
    State(state): State<AppState>,
    session: Session,
    mut req: Request<Body>,
    next: Next,
) -> Response {
    let user = match state.sessions.current_user(&session).await {
        Ok(user) => user,
        Err(e) => {
            tracing::warn!("Failed to read session, treating request as anonymous: {}", e);
            None
        }
    };

    let context = AuthContext::new(user);
    match context.user() {
        Some(user) => tracing::debug!("Request authenticated as {}", user.sub),
        None => tracing::trace!("Anonymous request"),
    }

    req.extensions_mut().insert(context);
    next.run(req).await
}
