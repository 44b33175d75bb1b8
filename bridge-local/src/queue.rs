//! Durable Work Queue using SQLite
//!
//! Persists queued work so it survives restarts. Messages move between two
//! states: `pending` (visible to `receive`) and `inflight` (claimed by a
//! consumer). Acknowledged messages are deleted; released messages return to
//! `pending` with an incremented retry count.

use async_trait::async_trait;
use bridge_traits::{
    error::{BridgeError, Result},
    queue::{QueueMessage, WorkQueue},
};
use sqlx::sqlite::{SqlitePool, SqlitePoolOptions};
use sqlx::Row;
use std::path::PathBuf;
use tracing::debug;
use uuid::Uuid;

/// SQLite-backed durable work queue.
pub struct SqliteWorkQueue {
    pool: SqlitePool,
}

impl SqliteWorkQueue {
    /// Open (or create) a queue database at the given path.
    pub async fn new(db_path: PathBuf) -> Result<Self> {
        if let Some(parent) = db_path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(BridgeError::Io)?;
        }

        let path_str = db_path.to_string_lossy().replace('\\', "/");
        let db_url = format!("sqlite://{}?mode=rwc", path_str);

        let pool = SqlitePool::connect(&db_url)
            .await
            .map_err(|e| BridgeError::DatabaseError(format!("Failed to connect to DB: {}", e)))?;

        let queue = Self { pool };
        queue.initialize().await?;
        debug!(path = ?db_path, "Initialized work queue");
        Ok(queue)
    }

    /// Create an in-memory queue (for testing).
    pub async fn in_memory() -> Result<Self> {
        // Single connection so every handle sees the same in-memory database.
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .map_err(|e| BridgeError::DatabaseError(format!("Failed to connect to DB: {}", e)))?;

        let queue = Self { pool };
        queue.initialize().await?;
        Ok(queue)
    }

    async fn initialize(&self) -> Result<()> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS work_queue (
                id TEXT PRIMARY KEY,
                body TEXT NOT NULL,
                status TEXT NOT NULL,
                retry_count INTEGER NOT NULL DEFAULT 0,
                created_at INTEGER NOT NULL,
                updated_at INTEGER NOT NULL,
                received_at INTEGER
            )
            "#,
        )
        .execute(&self.pool)
        .await
        .map_err(|e| BridgeError::DatabaseError(e.to_string()))?;

        sqlx::query(
            r#"
            CREATE INDEX IF NOT EXISTS idx_work_queue_status
            ON work_queue(status, created_at ASC)
            "#,
        )
        .execute(&self.pool)
        .await
        .map_err(|e| BridgeError::DatabaseError(e.to_string()))?;

        Ok(())
    }

    fn now() -> i64 {
        chrono::Utc::now().timestamp()
    }

    /// Count messages currently pending delivery.
    pub async fn pending_count(&self) -> Result<u64> {
        let row = sqlx::query("SELECT COUNT(*) as cnt FROM work_queue WHERE status = 'pending'")
            .fetch_one(&self.pool)
            .await
            .map_err(|e| BridgeError::DatabaseError(e.to_string()))?;
        let count: i64 = row.get("cnt");
        Ok(count as u64)
    }
}

#[async_trait]
impl WorkQueue for SqliteWorkQueue {
    async fn send(&self, body: String) -> Result<()> {
        let now = Self::now();
        sqlx::query(
            r#"
            INSERT INTO work_queue (id, body, status, retry_count, created_at, updated_at)
            VALUES (?, ?, 'pending', 0, ?, ?)
            "#,
        )
        .bind(Uuid::new_v4().to_string())
        .bind(&body)
        .bind(now)
        .bind(now)
        .execute(&self.pool)
        .await
        .map_err(|e| BridgeError::DatabaseError(e.to_string()))?;

        Ok(())
    }

    async fn receive(&self, max_messages: u32) -> Result<Vec<QueueMessage>> {
        // Claim atomically so two consumers never receive the same message.
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| BridgeError::DatabaseError(e.to_string()))?;

        let rows = sqlx::query(
            r#"
            SELECT id, body FROM work_queue
            WHERE status = 'pending'
            ORDER BY created_at ASC, rowid ASC
            LIMIT ?
            "#,
        )
        .bind(max_messages as i64)
        .fetch_all(&mut *tx)
        .await
        .map_err(|e| BridgeError::DatabaseError(e.to_string()))?;

        let now = Self::now();
        let mut messages = Vec::with_capacity(rows.len());
        for row in rows {
            let id: String = row.get("id");
            let body: String = row.get("body");

            sqlx::query(
                r#"
                UPDATE work_queue
                SET status = 'inflight', received_at = ?, updated_at = ?
                WHERE id = ?
                "#,
            )
            .bind(now)
            .bind(now)
            .bind(&id)
            .execute(&mut *tx)
            .await
            .map_err(|e| BridgeError::DatabaseError(e.to_string()))?;

            messages.push(QueueMessage { id, body });
        }

        tx.commit()
            .await
            .map_err(|e| BridgeError::DatabaseError(e.to_string()))?;

        debug!(count = messages.len(), "Received queue batch");
        Ok(messages)
    }

    async fn acknowledge(&self, message_id: &str) -> Result<()> {
        sqlx::query("DELETE FROM work_queue WHERE id = ?")
            .bind(message_id)
            .execute(&self.pool)
            .await
            .map_err(|e| BridgeError::DatabaseError(e.to_string()))?;
        Ok(())
    }

    async fn release(&self, message_id: &str) -> Result<()> {
        sqlx::query(
            r#"
            UPDATE work_queue
            SET status = 'pending', retry_count = retry_count + 1,
                received_at = NULL, updated_at = ?
            WHERE id = ?
            "#,
        )
        .bind(Self::now())
        .bind(message_id)
        .execute(&self.pool)
        .await
        .map_err(|e| BridgeError::DatabaseError(e.to_string()))?;
        Ok(())
    }
}
