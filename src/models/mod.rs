mod user;
mod forms;
mod task;

pub use user::{AuthenticatedUser, SessionUser, ProfileResponse, PublicProfile};
pub use forms::{LoginQuery, CallbackQuery};
pub use task::{CreateTaskRequest, NewTask, TaskCreated};
