use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// Profile of the logged-in caller, as reported by the identity provider's
/// userinfo endpoint.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct AuthenticatedUser {
    /// Provider-issued subject identifier; owner key for tasks.
    pub sub: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub picture: Option<String>,
}

/// What the callback stores in the session after a successful login.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct SessionUser {
    pub user: AuthenticatedUser,
    pub logged_in_at: DateTime<Utc>,
}

impl SessionUser {
    /// Sessions are dropped after a week regardless of activity.
    pub const ABSOLUTE_LIFETIME_DAYS: i64 = 7;

    pub fn new(user: AuthenticatedUser) -> Self {
        Self {
            user,
            logged_in_at: Utc::now(),
        }
    }

    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        now - self.logged_in_at >= Duration::days(Self::ABSOLUTE_LIFETIME_DAYS)
    }
}

#[derive(Debug, Serialize)]
pub struct ProfileResponse {
    pub message: &'static str,
    pub user: PublicProfile,
}

#[derive(Debug, Serialize)]
pub struct PublicProfile {
    pub name: Option<String>,
    pub email: Option<String>,
    pub picture: Option<String>,
}

impl From<&AuthenticatedUser> for PublicProfile {
    fn from(user: &AuthenticatedUser) -> Self {
        Self {
            name: user.name.clone(),
            email: user.email.clone(),
            picture: user.picture.clone(),
        }
    }
}
