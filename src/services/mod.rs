pub mod database;
pub mod oidc;
pub mod task_store;

pub use database::Database;
pub use oidc::{OidcClient, PendingLogin, ProviderMetadata};
pub use task_store::{MySqlTaskStore, TaskStore};
