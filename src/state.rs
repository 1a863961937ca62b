use std::sync::Arc;

use crate::config::Config;
use crate::middleware::{RateLimiter, SessionValidator};
use crate::services::{OidcClient, TaskStore};

/// Everything a request handler may touch, built once in `main`.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub tasks: Arc<dyn TaskStore>,
    pub sessions: Arc<dyn SessionValidator>,
    pub oidc: Arc<OidcClient>,
    pub limiter: Arc<RateLimiter>,
}
