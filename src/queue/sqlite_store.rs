//! SQLite implementation of TaskStore.

use std::path::Path;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::SqlitePool;
use tracing::error;

use super::store::{StoreError, StoredTask, TaskStore};
use crate::task::{TaskId, TaskSpec};

const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS commands (
    id         INTEGER PRIMARY KEY,
    command    TEXT NOT NULL,
    status     INTEGER NOT NULL DEFAULT 0,
    created_at TEXT NOT NULL DEFAULT (datetime('now'))
);

CREATE INDEX IF NOT EXISTS idx_commands_status ON commands(status, id);
"#;

/// SQLite-backed task store.
///
/// Each record holds the JSON-encoded, variant-tagged [`TaskSpec`] in the
/// `command` column and its status as an integer (0 pending, 1 done).
#[derive(Clone)]
pub struct SqliteTaskStore {
    pool: SqlitePool,
}

impl SqliteTaskStore {
    /// Create a new store around an existing pool.
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Open (creating if missing) the database at `path` and ensure the
    /// schema exists. Call once at process start; the handle is cheap to
    /// clone and closes with the last clone.
    pub async fn open(path: &Path) -> Result<Self, StoreError> {
        let options = SqliteConnectOptions::new()
            .filename(path)
            .create_if_missing(true);
        let pool = SqlitePoolOptions::new()
            .connect_with(options)
            .await
            .map_err(|e| StoreError::Storage(e.to_string()))?;

        let store = Self::new(pool);
        store.run_migrations().await?;
        Ok(store)
    }

    /// Run migrations to create the commands table.
    pub async fn run_migrations(&self) -> Result<(), StoreError> {
        for statement in SCHEMA.split(';') {
            let trimmed = statement.trim();
            if !trimmed.is_empty() {
                sqlx::query(trimmed)
                    .execute(&self.pool)
                    .await
                    .map_err(|e| StoreError::Storage(e.to_string()))?;
            }
        }
        Ok(())
    }
}

fn parse_created_at(raw: &str) -> DateTime<Utc> {
    // sqlite's datetime('now') is "YYYY-MM-DD HH:MM:SS" in UTC
    DateTime::parse_from_rfc3339(&format!("{}Z", raw.replace(' ', "T")))
        .map(|dt| dt.with_timezone(&Utc))
        .unwrap_or_else(|_| Utc::now())
}

#[async_trait]
impl TaskStore for SqliteTaskStore {
    async fn enqueue(&self, spec: &TaskSpec) -> Result<TaskId, StoreError> {
        let payload =
            serde_json::to_string(spec).map_err(|e| StoreError::Serialization(e.to_string()))?;

        let id = sqlx::query_scalar::<_, i64>(
            r#"
            INSERT INTO commands (command, status)
            VALUES (?, 0)
            RETURNING id
            "#,
        )
        .bind(&payload)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| StoreError::Storage(e.to_string()))?;

        Ok(TaskId(id))
    }

    async fn next_pending(&self) -> Result<Option<StoredTask>, StoreError> {
        let row = sqlx::query_as::<_, (i64, String, String)>(
            r#"
            SELECT id, command, created_at FROM commands
            WHERE status = 0
            ORDER BY id
            LIMIT 1
            "#,
        )
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| StoreError::Storage(e.to_string()))?;

        let Some((id, payload, created_at)) = row else {
            return Ok(None);
        };

        let spec: TaskSpec = serde_json::from_str(&payload).map_err(|e| {
            error!(id, error = %e, "corrupt task payload; refusing to skip record");
            StoreError::Deserialization {
                id: TaskId(id),
                message: e.to_string(),
            }
        })?;

        Ok(Some(StoredTask {
            id: TaskId(id),
            spec,
            created_at: parse_created_at(&created_at),
        }))
    }

    async fn mark_done(&self, id: TaskId) -> Result<(), StoreError> {
        sqlx::query("UPDATE commands SET status = 1 WHERE id = ?")
            .bind(id.0)
            .execute(&self.pool)
            .await
            .map_err(|e| StoreError::Storage(e.to_string()))?;

        Ok(())
    }

    async fn pending_count(&self) -> Result<u64, StoreError> {
        let count = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM commands WHERE status = 0")
            .fetch_one(&self.pool)
            .await
            .map_err(|e| StoreError::Storage(e.to_string()))?;

        Ok(count as u64)
    }
}
