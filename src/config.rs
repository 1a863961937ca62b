use std::time::Duration;

use config::{builder::DefaultState, ConfigBuilder, ConfigError};
use serde::Deserialize;
use url::Url;

#[derive(Debug, Clone)]
pub struct Config {
    pub server: ServerConfig,
    pub auth: AuthConfig,
    pub database: DatabaseConfig,
    pub rate_limit: RateLimitConfig,
}

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone)]
pub struct AuthConfig {
    pub secret: String,
    pub base_url: Url,
    pub client_id: String,
    pub client_secret: Option<String>,
    pub issuer_base_url: Url,
}

#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    pub host: String,
    pub port: u16,
    pub user: String,
    pub password: Option<String>,
    pub name: String,
    pub max_connections: u32,
}

#[derive(Debug, Clone)]
pub struct RateLimitConfig {
    pub window: Duration,
    pub max_requests: u32,
}

// Flat view of the environment, one field per variable.
#[derive(Debug, Deserialize)]
struct Settings {
    app_secret: String,
    auth0_base_url: String,
    auth0_client_id: String,
    auth0_domain: String,
    #[serde(default)]
    auth0_client_secret: Option<String>,
    bind_host: String,
    port: u16,
    db_host: String,
    db_port: u16,
    db_user: String,
    #[serde(default)]
    db_password: Option<String>,
    db_name: String,
    db_max_connections: u32,
    rate_limit_window_secs: u64,
    rate_limit_max_requests: u32,
}

impl Config {
    pub fn load() -> Result<Self, ConfigError> {
        let builder = config::Config::builder()
            .add_source(config::File::with_name("config/default").required(false))
            .add_source(config::Environment::default().try_parsing(true));

        Self::build(builder)
    }

    pub fn build(builder: ConfigBuilder<DefaultState>) -> Result<Self, ConfigError> {
        let settings: Settings = builder
            .set_default("bind_host", "0.0.0.0")?
            .set_default("port", 3000)?
            .set_default("db_host", "localhost")?
            .set_default("db_port", 3306)?
            .set_default("db_max_connections", 10)?
            .set_default("rate_limit_window_secs", 15 * 60)?
            .set_default("rate_limit_max_requests", 100)?
            .build()?
            .try_deserialize()?;

        settings.try_into()
    }
}

impl TryFrom<Settings> for Config {
    type Error = ConfigError;

    fn try_from(settings: Settings) -> Result<Self, Self::Error> {
        if settings.app_secret.is_empty() {
            return Err(ConfigError::Message("APP_SECRET must not be empty".into()));
        }
        if settings.rate_limit_max_requests == 0 || settings.rate_limit_window_secs == 0 {
            return Err(ConfigError::Message(
                "rate limit window and maximum must be positive".into(),
            ));
        }

        Ok(Config {
            server: ServerConfig {
                host: settings.bind_host,
                port: settings.port,
            },
            auth: AuthConfig {
                secret: settings.app_secret,
                base_url: parse_base_url("AUTH0_BASE_URL", &settings.auth0_base_url)?,
                client_id: settings.auth0_client_id,
                client_secret: settings.auth0_client_secret.filter(|s| !s.is_empty()),
                issuer_base_url: parse_base_url("AUTH0_DOMAIN", &settings.auth0_domain)?,
            },
            database: DatabaseConfig {
                host: settings.db_host,
                port: settings.db_port,
                user: settings.db_user,
                password: settings.db_password.filter(|s| !s.is_empty()),
                name: settings.db_name,
                max_connections: settings.db_max_connections,
            },
            rate_limit: RateLimitConfig {
                window: Duration::from_secs(settings.rate_limit_window_secs),
                max_requests: settings.rate_limit_max_requests,
            },
        })
    }
}

impl AuthConfig {
    pub fn redirect_url(&self) -> Url {
        join_path(&self.base_url, "callback")
    }

    pub fn is_secure(&self) -> bool {
        self.base_url.scheme() == "https"
    }
}

/// Resolves `path` below `base` without discarding the base's own path.
pub fn join_path(base: &Url, path: &str) -> Url {
    let mut url = base.clone();
    let joined = format!("{}/{}", base.path().trim_end_matches('/'), path);
    url.set_path(&joined);
    url
}

// Auth0 tenants are often given as a bare domain.
fn parse_base_url(name: &str, raw: &str) -> Result<Url, ConfigError> {
    let raw = raw.trim().trim_end_matches('/');
    let candidate = if raw.contains("://") {
        raw.to_string()
    } else {
        format!("https://{}", raw)
    };

    Url::parse(&candidate)
        .map_err(|e| ConfigError::Message(format!("{} is not a valid URL: {}", name, e)))
}
