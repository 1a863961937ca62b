pub mod auth;
pub mod rate_limit;

pub use auth::{attach_auth_context, AuthContext, OidcSessionValidator, SessionValidator};
pub use rate_limit::{rate_limit, RateLimiter};
