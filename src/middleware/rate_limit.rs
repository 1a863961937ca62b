//! Fixed-window rate limiting keyed by client address.
//!
//! Every client gets `max_requests` per window. The window opens with the
//! client's first request and resets once `window` has elapsed; requests past
//! the limit are answered with 429 until then.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::{
    body::Body,
    extract::{ConnectInfo, Request, State},
    http::HeaderValue,
    middleware::Next,
    response::{IntoResponse, Response},
};
use dashmap::DashMap;
use tokio::task::JoinHandle;

use crate::config::RateLimitConfig;
use crate::errors::response::{RATE_LIMIT_LIMIT_HEADER, RATE_LIMIT_REMAINING_HEADER};
use crate::errors::AppError;

const UNKNOWN_CLIENT: &str = "unknown";

#[derive(Debug, Clone, Copy)]
pub struct RateLimitWindow {
    pub window_start: Instant,
    pub count: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Allowed { remaining: u32 },
    Rejected { retry_after: Duration },
}

pub struct RateLimiter {
    windows: DashMap<String, RateLimitWindow>,
    window: Duration,
    max_requests: u32,
}

impl RateLimiter {
    pub fn new(config: &RateLimitConfig) -> Self {
        Self {
            windows: DashMap::new(),
            window: config.window,
            max_requests: config.max_requests,
        }
    }

    pub fn max_requests(&self) -> u32 {
        self.max_requests
    }

    pub fn check(&self, client_key: &str) -> Decision {
        self.check_at(client_key, Instant::now())
    }

    pub fn check_at(&self, client_key: &str, now: Instant) -> Decision {
        // The entry guard holds the shard lock, so the reset and increment
        // below happen atomically for this key.
        let mut entry = self
            .windows
            .entry(client_key.to_string())
            .or_insert(RateLimitWindow {
                window_start: now,
                count: 0,
            });

        let elapsed = now.saturating_duration_since(entry.window_start);
        if elapsed >= self.window {
            entry.window_start = now;
            entry.count = 0;
        }

        entry.count = entry.count.saturating_add(1);
        if entry.count <= self.max_requests {
            Decision::Allowed {
                remaining: self.max_requests - entry.count,
            }
        } else {
            let elapsed = now.saturating_duration_since(entry.window_start);
            Decision::Rejected {
                retry_after: self.window.saturating_sub(elapsed),
            }
        }
    }

    /// Drops windows that have run out; they would be reset on next use anyway.
    pub fn sweep_at(&self, now: Instant) {
        self.windows
            .retain(|_, w| now.saturating_duration_since(w.window_start) < self.window);
    }

    pub fn tracked_clients(&self) -> usize {
        self.windows.len()
    }

    pub fn spawn_sweeper(self: &Arc<Self>) -> JoinHandle<()> {
        let limiter = Arc::clone(self);
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(limiter.window);
            loop {
                interval.tick().await;
                limiter.sweep_at(Instant::now());
                tracing::debug!(
                    "Rate limiter sweep done, {} client(s) tracked",
                    limiter.tracked_clients()
                );
            }
        })
    }
}

// Forwarded headers are deliberately not consulted; see DESIGN.md.
fn client_key(req: &Request<Body>) -> String {
    req.extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|info| info.0.ip().to_string())
        .unwrap_or_else(|| UNKNOWN_CLIENT.to_string())
}

pub async fn rate_limit(
    State(limiter): State<Arc<RateLimiter>>,
    req: Request<Body>,
    next: Next,
) -> Response {
    let key = client_key(&req);

    match limiter.check(&key) {
        Decision::Allowed { remaining } => {
            let mut response = next.run(req).await;
            let headers = response.headers_mut();
            headers.insert(
                RATE_LIMIT_LIMIT_HEADER,
                HeaderValue::from(limiter.max_requests()),
            );
            headers.insert(RATE_LIMIT_REMAINING_HEADER, HeaderValue::from(remaining));
            response
        }
        Decision::Rejected { retry_after } => {
            tracing::warn!("Rate limit exceeded for {}", key);
            AppError::RateLimited {
                limit: limiter.max_requests(),
                retry_after,
            }
            .into_response()
        }
    }
}
