use async_trait::async_trait;

use crate::models::NewTask;
use crate::services::database::{Database, SqlParam};

const INSERT_TASK: &str = "INSERT INTO tasks (user_id, title, description, difficulty, type, due_date) \
     VALUES (?, ?, ?, ?, ?, ?)";

/// Persistence for tasks created through the API.
#[async_trait]
pub trait TaskStore: Send + Sync {
    /// Inserts one task row and returns its database-assigned id.
    async fn insert_task(&self, task: &NewTask) -> Result<u64, sqlx::Error>;
}

pub struct MySqlTaskStore {
    database: Database,
}

impl MySqlTaskStore {
    pub fn new(database: Database) -> Self {
        Self { database }
    }
}

fn insert_params(task: &NewTask) -> Vec<SqlParam> {
    vec![
        SqlParam::from(task.user_id.as_str()),
        SqlParam::from(&task.title),
        SqlParam::from(&task.description),
        SqlParam::from(&task.difficulty),
        SqlParam::from(&task.task_type),
        SqlParam::from(&task.due_date),
    ]
}

#[async_trait]
impl TaskStore for MySqlTaskStore {
    async fn insert_task(&self, task: &NewTask) -> Result<u64, sqlx::Error> {
        let outcome = self.database.execute(INSERT_TASK, &insert_params(task)).await?;
        if outcome.rows_affected != 1 {
            tracing::warn!("Task insert affected {} rows", outcome.rows_affected);
        }
        Ok(outcome.last_insert_id)
    }
}
