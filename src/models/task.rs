use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Body of `POST /tasks`. Fields are kept as raw JSON values and handed to the
/// database untouched; absent fields become SQL NULL.
#[derive(Debug, Default, Deserialize)]
pub struct CreateTaskRequest {
    #[serde(default)]
    pub title: Value,
    #[serde(default)]
    pub description: Value,
    #[serde(default)]
    pub difficulty: Value,
    #[serde(default, rename = "type")]
    pub task_type: Value,
    #[serde(default)]
    pub due_date: Value,
}

impl CreateTaskRequest {
    /// An empty body is treated as `{}`.
    pub fn from_body(body: &[u8]) -> Result<Self, serde_json::Error> {
        if body.iter().all(u8::is_ascii_whitespace) {
            return Ok(Self::default());
        }
        serde_json::from_slice(body)
    }

    /// Binds the request to its owner. The owner always comes from the
    /// authenticated session, never from the body.
    pub fn into_new_task(self, user_id: &str) -> NewTask {
        NewTask {
            user_id: user_id.to_string(),
            title: self.title,
            description: self.description,
            difficulty: self.difficulty,
            task_type: self.task_type,
            due_date: self.due_date,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewTask {
    pub user_id: String,
    pub title: Value,
    pub description: Value,
    pub difficulty: Value,
    pub task_type: Value,
    pub due_date: Value,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskCreated {
    pub message: &'static str,
    pub task_id: u64,
}
