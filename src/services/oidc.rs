//! Client side of the identity provider's redirect flow.
//!
//! Discovery, authorization URL construction (state + PKCE), code exchange
//! and the userinfo lookup are all delegated to the provider; nothing here
//! validates tokens on its own.

use oauth2::{
    basic::{BasicClient, BasicRequestTokenError},
    AuthUrl, AuthorizationCode, ClientId, ClientSecret, CsrfToken, EndpointNotSet, EndpointSet,
    HttpClientError, PkceCodeChallenge, PkceCodeVerifier, RedirectUrl, RequestTokenError, Scope,
    TokenResponse, TokenUrl,
};
use serde::{Deserialize, Serialize};
use url::Url;

use crate::config::{join_path, AuthConfig};
use crate::errors::{AppError, AppResult};
use crate::models::AuthenticatedUser;

type ConfiguredClient =
    BasicClient<EndpointSet, EndpointNotSet, EndpointNotSet, EndpointNotSet, EndpointSet>;

const SCOPES: [&str; 3] = ["openid", "profile", "email"];

/// Subset of the provider's `.well-known/openid-configuration` document.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderMetadata {
    pub issuer: String,
    pub authorization_endpoint: Url,
    pub token_endpoint: Url,
    #[serde(default)]
    pub userinfo_endpoint: Option<Url>,
}

impl ProviderMetadata {
    pub async fn discover(http: &reqwest::Client, issuer: &Url) -> AppResult<Self> {
        let discovery_url = join_path(issuer, ".well-known/openid-configuration");
        tracing::info!("Discovering identity provider at {}", discovery_url);

        let response = http
            .get(discovery_url.clone())
            .send()
            .await
            .map_err(|e| AppError::Provider(format!("Discovery request failed: {}", e)))?;

        if !response.status().is_success() {
            return Err(AppError::Provider(format!(
                "Discovery failed with status {}",
                response.status()
            )));
        }

        response
            .json()
            .await
            .map_err(|e| AppError::Provider(format!("Invalid discovery document: {}", e)))
    }
}

/// Login attempt parked in the session between `/login` and `/callback`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PendingLogin {
    pub csrf_state: String,
    pub pkce_verifier: String,
    pub nonce: String,
    pub return_to: String,
}

pub struct OidcClient {
    oauth: ConfiguredClient,
    http: reqwest::Client,
    userinfo_endpoint: Url,
    logout_endpoint: Url,
    client_id: String,
    base_url: Url,
}

impl OidcClient {
    /// Provider calls must not follow redirects.
    pub fn http_client() -> reqwest::Result<reqwest::Client> {
        reqwest::Client::builder()
            .redirect(reqwest::redirect::Policy::none())
            .build()
    }

    pub fn new(config: &AuthConfig, metadata: ProviderMetadata, http: reqwest::Client) -> Self {
        let mut oauth = BasicClient::new(ClientId::new(config.client_id.clone()))
            .set_auth_uri(AuthUrl::from_url(metadata.authorization_endpoint))
            .set_token_uri(TokenUrl::from_url(metadata.token_endpoint))
            .set_redirect_uri(RedirectUrl::from_url(config.redirect_url()));
        if let Some(secret) = &config.client_secret {
            oauth = oauth.set_client_secret(ClientSecret::new(secret.clone()));
        }

        // Auth0 serves userinfo and logout at fixed paths below the issuer.
        let userinfo_endpoint = metadata
            .userinfo_endpoint
            .unwrap_or_else(|| join_path(&config.issuer_base_url, "userinfo"));

        Self {
            oauth,
            http,
            userinfo_endpoint,
            logout_endpoint: join_path(&config.issuer_base_url, "v2/logout"),
            client_id: config.client_id.clone(),
            base_url: config.base_url.clone(),
        }
    }

    pub fn authorize(&self, return_to: Option<&str>) -> (Url, PendingLogin) {
        let (challenge, verifier) = PkceCodeChallenge::new_random_sha256();
        let nonce = CsrfToken::new_random();
        let mut request = self
            .oauth
            .authorize_url(CsrfToken::new_random)
            .set_pkce_challenge(challenge)
            .add_extra_param("nonce", nonce.secret().clone());
        for scope in SCOPES {
            request = request.add_scope(Scope::new(scope.to_string()));
        }
        let (url, csrf_state) = request.url();

        let pending = PendingLogin {
            csrf_state: csrf_state.secret().clone(),
            pkce_verifier: verifier.secret().clone(),
            nonce: nonce.secret().clone(),
            return_to: local_return_path(return_to),
        };
        (url, pending)
    }

    pub async fn exchange_code(&self, code: &str, pkce_verifier: &str) -> AppResult<String> {
        let token = self
            .oauth
            .exchange_code(AuthorizationCode::new(code.to_string()))
            .set_pkce_verifier(PkceCodeVerifier::new(pkce_verifier.to_string()))
            .request_async(&self.http)
            .await
            .map_err(|e| AppError::Provider(format!("Token exchange failed: {}", describe(&e))))?;

        Ok(token.access_token().secret().clone())
    }

    pub async fn fetch_user(&self, access_token: &str) -> AppResult<AuthenticatedUser> {
        let response = self
            .http
            .get(self.userinfo_endpoint.clone())
            .bearer_auth(access_token)
            .send()
            .await
            .map_err(|e| AppError::Provider(format!("User info request failed: {}", e)))?;

        if !response.status().is_success() {
            return Err(AppError::Provider(format!(
                "User info request failed with status {}",
                response.status()
            )));
        }

        response
            .json()
            .await
            .map_err(|e| AppError::Provider(format!("Failed to parse user info: {}", e)))
    }

    pub fn logout_url(&self) -> Url {
        let mut url = self.logout_endpoint.clone();
        url.query_pairs_mut()
            .append_pair("client_id", &self.client_id)
            .append_pair("returnTo", self.base_url.as_str());
        url
    }
}

fn describe(err: &BasicRequestTokenError<HttpClientError<reqwest::Error>>) -> String {
    match err {
        RequestTokenError::ServerResponse(response) => response
            .error_description()
            .cloned()
            .unwrap_or_else(|| response.error().as_ref().to_string()),
        other => other.to_string(),
    }
}

// Only same-origin paths are accepted so the callback can't be turned into an
// open redirect.
fn local_return_path(raw: Option<&str>) -> String {
    match raw {
        Some(path) if path.starts_with('/') && !path.starts_with("//") && !path.contains('\\') => {
            path.to_string()
        }
        _ => "/".to_string(),
    }
}
