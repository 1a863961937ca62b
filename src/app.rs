use axum::{
    middleware::from_fn_with_state,
    routing::{get, post},
    Router,
};
use sha2::{Digest, Sha512};
use tower_http::trace::TraceLayer;
use tower_sessions::{
    cookie::{time::Duration, Key, SameSite},
    service::SignedCookie,
    Expiry, MemoryStore, SessionManagerLayer,
};

use crate::config::AuthConfig;
use crate::{handlers, middleware, state::AppState};

pub const SESSION_COOKIE: &str = "playerone.sid";

/// Layers run outermost first: tracing, rate limit, session, auth context,
/// handler. Request bodies are size-checked by the handlers that read them,
/// after authentication.
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(handlers::home))
        .route("/profile", get(handlers::profile))
        .route("/tasks", post(handlers::create_task))
        .route("/login", get(handlers::login))
        .route("/callback", get(handlers::callback))
        .route("/logout", get(handlers::logout))
        .layer(from_fn_with_state(state.clone(), middleware::attach_auth_context))
        .layer(session_layer(&state.config.auth))
        .layer(from_fn_with_state(state.limiter.clone(), middleware::rate_limit))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

fn session_layer(auth: &AuthConfig) -> SessionManagerLayer<MemoryStore, SignedCookie> {
    SessionManagerLayer::new(MemoryStore::default())
        .with_name(SESSION_COOKIE)
        .with_secure(auth.is_secure())
        .with_http_only(true)
        .with_same_site(SameSite::Lax)
        .with_expiry(Expiry::OnInactivity(Duration::hours(24)))
        .with_signed(signing_key(&auth.secret))
}

// Cookie keys need 64 bytes; stretch the configured secret to that length.
fn signing_key(secret: &str) -> Key {
    let digest = Sha512::digest(secret.as_bytes());
    Key::from(digest.as_slice())
}
