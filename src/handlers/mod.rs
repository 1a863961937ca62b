mod auth;
mod profile;
mod task;

pub use auth::{login, callback, logout};
pub use profile::{home, profile};
pub use task::create_task;
