//! Test helpers and mocks for router tests.

use std::net::SocketAddr;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use axum::{
    body::Body,
    extract::ConnectInfo,
    http::{header, Request, StatusCode},
    response::Response,
    Router,
};
use httpmock::prelude::*;
use serde_json::json;
use tower::ServiceExt;
use url::Url;

use crate::app::{build_router, SESSION_COOKIE};
use crate::config::{AuthConfig, Config, DatabaseConfig, RateLimitConfig, ServerConfig};
use crate::middleware::{OidcSessionValidator, RateLimiter};
use crate::models::{AuthenticatedUser, NewTask};
use crate::services::{OidcClient, ProviderMetadata, TaskStore};
use crate::state::AppState;

pub const ACCESS_TOKEN: &str = "access-token-123";

/// Task store that keeps rows in memory and can be told to fail like an
/// unreachable database.
#[derive(Default)]
pub struct MemoryTaskStore {
    rows: Mutex<Vec<(u64, NewTask)>>,
    calls: Mutex<usize>,
    fail: AtomicBool,
}

impl MemoryTaskStore {
    pub fn fail_with_connection_refused(&self) {
        self.fail.store(true, Ordering::SeqCst);
    }

    pub fn rows(&self) -> Vec<(u64, NewTask)> {
        self.rows.lock().unwrap().clone()
    }

    pub fn calls(&self) -> usize {
        *self.calls.lock().unwrap()
    }
}

#[async_trait]
impl TaskStore for MemoryTaskStore {
    async fn insert_task(&self, task: &NewTask) -> Result<u64, sqlx::Error> {
        *self.calls.lock().unwrap() += 1;
        if self.fail.load(Ordering::SeqCst) {
            return Err(sqlx::Error::Io(std::io::Error::new(
                std::io::ErrorKind::ConnectionRefused,
                "Connection refused",
            )));
        }

        let mut rows = self.rows.lock().unwrap();
        let id = rows.len() as u64 + 1;
        rows.push((id, task.clone()));
        Ok(id)
    }
}

pub fn test_user() -> AuthenticatedUser {
    AuthenticatedUser {
        sub: "auth0|player-one".into(),
        name: Some("Player One".into()),
        email: Some("player@example.com".into()),
        picture: Some("https://example.com/player.png".into()),
    }
}

pub struct TestApp {
    pub router: Router,
    pub tasks: Arc<MemoryTaskStore>,
    pub provider: MockServer,
}

impl TestApp {
    pub async fn spawn() -> Self {
        let provider = MockServer::start_async().await;
        let issuer = Url::parse(&provider.base_url()).unwrap();

        let config = Config {
            server: ServerConfig {
                host: "127.0.0.1".into(),
                port: 3000,
            },
            auth: AuthConfig {
                secret: "test-secret-that-is-long-enough-for-signing".into(),
                base_url: Url::parse("http://localhost:3000").unwrap(),
                client_id: "test-client".into(),
                client_secret: Some("test-client-secret".into()),
                issuer_base_url: issuer,
            },
            database: DatabaseConfig {
                host: "localhost".into(),
                port: 3306,
                user: "test".into(),
                password: None,
                name: "test".into(),
                max_connections: 1,
            },
            rate_limit: RateLimitConfig {
                window: Duration::from_secs(15 * 60),
                max_requests: 100,
            },
        };

        let metadata = ProviderMetadata {
            issuer: provider.base_url(),
            authorization_endpoint: Url::parse(&provider.url("/authorize")).unwrap(),
            token_endpoint: Url::parse(&provider.url("/oauth/token")).unwrap(),
            userinfo_endpoint: Some(Url::parse(&provider.url("/userinfo")).unwrap()),
        };
        let http = OidcClient::http_client().unwrap();
        let oidc = OidcClient::new(&config.auth, metadata, http);

        let tasks = Arc::new(MemoryTaskStore::default());
        let state = AppState {
            limiter: Arc::new(RateLimiter::new(&config.rate_limit)),
            config: Arc::new(config),
            tasks: tasks.clone(),
            sessions: Arc::new(OidcSessionValidator),
            oidc: Arc::new(oidc),
        };

        Self {
            router: build_router(state),
            tasks,
            provider,
        }
    }

    pub async fn send(&self, req: Request<Body>) -> Response {
        self.send_from(req, "127.0.0.1:50000").await
    }

    pub async fn send_from(&self, mut req: Request<Body>, peer: &str) -> Response {
        let addr: SocketAddr = peer.parse().unwrap();
        req.extensions_mut().insert(ConnectInfo(addr));
        self.router.clone().oneshot(req).await.unwrap()
    }

    pub async fn get(&self, uri: &str, cookie: Option<&str>) -> Response {
        let mut builder = Request::builder().method("GET").uri(uri);
        if let Some(cookie) = cookie {
            builder = builder.header(header::COOKIE, cookie);
        }
        self.send(builder.body(Body::empty()).unwrap()).await
    }

    pub async fn post_json(&self, uri: &str, body: &str, cookie: Option<&str>) -> Response {
        let mut builder = Request::builder()
            .method("POST")
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json");
        if let Some(cookie) = cookie {
            builder = builder.header(header::COOKIE, cookie);
        }
        self.send(builder.body(Body::from(body.to_string())).unwrap())
            .await
    }

    /// Registers provider responses for a successful code exchange.
    pub async fn mock_provider_login(&self, user: &AuthenticatedUser) {
        self.provider
            .mock_async(|when, then| {
                when.method(POST).path("/oauth/token");
                then.status(200)
                    .header("content-type", "application/json")
                    .json_body(json!({
                        "access_token": ACCESS_TOKEN,
                        "token_type": "Bearer",
                        "expires_in": 86400,
                    }));
            })
            .await;

        let profile = serde_json::to_value(user).unwrap();
        self.provider
            .mock_async(|when, then| {
                when.method(GET)
                    .path("/userinfo")
                    .header("authorization", format!("Bearer {}", ACCESS_TOKEN));
                then.status(200)
                    .header("content-type", "application/json")
                    .json_body(profile);
            })
            .await;
    }

    /// Starts a login and returns the session cookie together with the
    /// `state` the provider would echo back.
    pub async fn start_login(&self, uri: &str) -> (String, String) {
        let response = self.get(uri, None).await;
        assert_eq!(response.status(), StatusCode::SEE_OTHER);

        let location = Url::parse(location(&response)).unwrap();
        let state = location
            .query_pairs()
            .find(|(k, _)| k == "state")
            .map(|(_, v)| v.into_owned())
            .unwrap();

        (session_cookie(&response).unwrap(), state)
    }

    /// Runs the whole redirect flow against the mocked provider and returns
    /// the authenticated session cookie.
    pub async fn login_as(&self, user: &AuthenticatedUser) -> String {
        self.mock_provider_login(user).await;
        let (cookie, state) = self.start_login("/login").await;

        let response = self
            .get(
                &format!("/callback?code=test-code&state={}", state),
                Some(&cookie),
            )
            .await;
        assert_eq!(response.status(), StatusCode::SEE_OTHER);

        session_cookie(&response).unwrap_or(cookie)
    }
}

pub fn location(response: &Response) -> &str {
    response.headers()[header::LOCATION].to_str().unwrap()
}

pub fn session_cookie(response: &Response) -> Option<String> {
    response
        .headers()
        .get_all(header::SET_COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .find(|value| value.starts_with(&format!("{}=", SESSION_COOKIE)))
        .and_then(|value| value.split(';').next())
        .map(str::to_string)
}

pub async fn body_text(response: Response) -> String {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    String::from_utf8(bytes.to_vec()).unwrap()
}

pub async fn body_json(response: Response) -> serde_json::Value {
    serde_json::from_str(&body_text(response).await).unwrap()
}
