use serde_json::Value;
use sqlx::{
    mysql::{MySqlConnectOptions, MySqlPoolOptions},
    MySqlPool,
};

use crate::config::DatabaseConfig;

/// A single positional bind parameter.
#[derive(Debug, Clone, PartialEq)]
pub enum SqlParam {
    Null,
    Bool(bool),
    Int(i64),
    UInt(u64),
    Float(f64),
    Text(String),
}

impl From<&str> for SqlParam {
    fn from(value: &str) -> Self {
        SqlParam::Text(value.to_string())
    }
}

// JSON values map onto the closest MySQL type. Arrays and objects have no
// column equivalent and are bound as their JSON text.
impl From<&Value> for SqlParam {
    fn from(value: &Value) -> Self {
        match value {
            Value::Null => SqlParam::Null,
            Value::Bool(b) => SqlParam::Bool(*b),
            Value::Number(n) => {
                if let Some(i) = n.as_i64() {
                    SqlParam::Int(i)
                } else if let Some(u) = n.as_u64() {
                    SqlParam::UInt(u)
                } else {
                    SqlParam::Float(n.as_f64().unwrap_or_default())
                }
            }
            Value::String(s) => SqlParam::Text(s.clone()),
            other => SqlParam::Text(other.to_string()),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExecOutcome {
    pub rows_affected: u64,
    pub last_insert_id: u64,
}

#[derive(Clone)]
pub struct Database {
    pool: MySqlPool,
}

impl Database {
    /// Builds the pool without opening a connection; the first query connects.
    pub fn connect_lazy(config: &DatabaseConfig) -> Self {
        let mut options = MySqlConnectOptions::new()
            .host(&config.host)
            .port(config.port)
            .username(&config.user)
            .database(&config.name);
        if let Some(password) = &config.password {
            options = options.password(password);
        }

        let pool = MySqlPoolOptions::new()
            .max_connections(config.max_connections)
            .connect_lazy_with(options);

        tracing::info!(
            "Database pool configured for {}@{}:{}/{}",
            config.user,
            config.host,
            config.port,
            config.name
        );
        Self { pool }
    }

    #[cfg(test)]
    pub fn from_pool(pool: MySqlPool) -> Self {
        Self { pool }
    }

    pub async fn execute(&self, query: &str, params: &[SqlParam]) -> Result<ExecOutcome, sqlx::Error> {
        let mut statement = sqlx::query(query);
        for param in params {
            statement = match param {
                SqlParam::Null => statement.bind(None::<String>),
                SqlParam::Bool(b) => statement.bind(*b),
                SqlParam::Int(i) => statement.bind(*i),
                SqlParam::UInt(u) => statement.bind(*u),
                SqlParam::Float(f) => statement.bind(*f),
                SqlParam::Text(s) => statement.bind(s.clone()),
            };
        }

        let result = statement.execute(&self.pool).await?;
        tracing::debug!(
            "Statement affected {} row(s), last insert id {}",
            result.rows_affected(),
            result.last_insert_id()
        );

        Ok(ExecOutcome {
            rows_affected: result.rows_affected(),
            last_insert_id: result.last_insert_id(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn json_values_map_to_bind_types() {
        assert_eq!(SqlParam::from(&json!(null)), SqlParam::Null);
        assert_eq!(SqlParam::from(&json!(true)), SqlParam::Bool(true));
        assert_eq!(SqlParam::from(&json!(3)), SqlParam::Int(3));
        assert_eq!(SqlParam::from(&json!(u64::MAX)), SqlParam::UInt(u64::MAX));
        assert_eq!(SqlParam::from(&json!(2.5)), SqlParam::Float(2.5));
        assert_eq!(SqlParam::from(&json!("daily")), SqlParam::Text("daily".into()));
    }

    #[test]
    fn structured_values_bind_as_json_text() {
        assert_eq!(
            SqlParam::from(&json!({"a": [1, 2]})),
            SqlParam::Text(r#"{"a":[1,2]}"#.into())
        );
    }
}
