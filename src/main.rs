mod app;
mod config;
mod errors;
mod handlers;
mod middleware;
mod models;
mod services;
mod state;


use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;

use crate::{
    config::Config,
    middleware::{OidcSessionValidator, RateLimiter},
    services::{Database, MySqlTaskStore, OidcClient, ProviderMetadata},
    state::AppState,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();

    let config = Arc::new(Config::load().context("Failed to load configuration")?);

    let database = Database::connect_lazy(&config.database);

    let http = OidcClient::http_client().context("Failed to build HTTP client")?;
    let metadata = ProviderMetadata::discover(&http, &config.auth.issuer_base_url)
        .await
        .context("Identity provider discovery failed")?;
    tracing::info!("Using identity provider {}", metadata.issuer);
    let oidc = OidcClient::new(&config.auth, metadata, http);

    let limiter = Arc::new(RateLimiter::new(&config.rate_limit));
    limiter.spawn_sweeper();

    let state = AppState {
        config: config.clone(),
        tasks: Arc::new(MySqlTaskStore::new(database)),
        sessions: Arc::new(OidcSessionValidator),
        oidc: Arc::new(oidc),
        limiter,
    };
    let app = app::build_router(state);

    let listener = tokio::net::TcpListener::bind((config.server.host.as_str(), config.server.port))
        .await
        .with_context(|| format!("Failed to bind {}:{}", config.server.host, config.server.port))?;

    tracing::info!("Server is running on {}", config.auth.base_url);
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await
    .context("Server terminated unexpectedly")?;

    Ok(())
}
