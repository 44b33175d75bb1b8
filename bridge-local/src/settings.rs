//! Settings Storage using SQLite
//!
//! Durable key-value storage backing the integration record (configured
//! folder path, sync cursor).

use async_trait::async_trait;
use bridge_traits::{
    error::{BridgeError, Result},
    settings::SettingsStore,
};
use sqlx::sqlite::{SqlitePool, SqlitePoolOptions};
use sqlx::Row;
use std::path::PathBuf;
use tracing::debug;

/// SQLite-backed settings store implementation.
pub struct SqliteSettingsStore {
    pool: SqlitePool,
}

impl SqliteSettingsStore {
    /// Create a new settings store with the given database path.
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

        let store = Self { pool };
        store.initialize().await?;
        debug!(path = ?db_path, "Initialized settings store");
        Ok(store)
    }

    /// Create an in-memory settings store (for testing).
    pub async fn in_memory() -> Result<Self> {
        // Single connection so every handle sees the same in-memory database.
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .map_err(|e| BridgeError::DatabaseError(format!("Failed to connect to DB: {}", e)))?;

        let store = Self { pool };
        store.initialize().await?;
        Ok(store)
    }

    async fn initialize(&self) -> Result<()> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS settings (
                key TEXT PRIMARY KEY,
                value TEXT NOT NULL,
                updated_at INTEGER NOT NULL
            )
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

    async fn upsert(&self, key: &str, value: String) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO settings (key, value, updated_at) VALUES (?, ?, ?)
            ON CONFLICT(key) DO UPDATE SET value = excluded.value, updated_at = excluded.updated_at
            "#,
        )
        .bind(key)
        .bind(value)
        .bind(Self::now())
        .execute(&self.pool)
        .await
        .map_err(|e| BridgeError::DatabaseError(e.to_string()))?;
        Ok(())
    }

    async fn fetch(&self, key: &str) -> Result<Option<String>> {
        let row = sqlx::query("SELECT value FROM settings WHERE key = ?")
            .bind(key)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| BridgeError::DatabaseError(e.to_string()))?;
        Ok(row.map(|r| r.get("value")))
    }
}

#[async_trait]
impl SettingsStore for SqliteSettingsStore {
    async fn set_string(&self, key: &str, value: &str) -> Result<()> {
        self.upsert(key, value.to_string()).await
    }

    async fn get_string(&self, key: &str) -> Result<Option<String>> {
        self.fetch(key).await
    }

    async fn set_i64(&self, key: &str, value: i64) -> Result<()> {
        self.upsert(key, value.to_string()).await
    }

    async fn get_i64(&self, key: &str) -> Result<Option<i64>> {
        match self.fetch(key).await? {
            Some(value) => value.parse().map(Some).map_err(|e| {
                BridgeError::OperationFailed(format!("Invalid integer for key {}: {}", key, e))
            }),
            None => Ok(None),
        }
    }

    async fn delete(&self, key: &str) -> Result<()> {
        sqlx::query("DELETE FROM settings WHERE key = ?")
            .bind(key)
            .execute(&self.pool)
            .await
            .map_err(|e| BridgeError::DatabaseError(e.to_string()))?;
        Ok(())
    }

    async fn has_key(&self, key: &str) -> Result<bool> {
        Ok(self.fetch(key).await?.is_some())
    }

    async fn list_keys(&self) -> Result<Vec<String>> {
        let rows = sqlx::query("SELECT key FROM settings ORDER BY key")
            .fetch_all(&self.pool)
            .await
            .map_err(|e| BridgeError::DatabaseError(e.to_string()))?;
        Ok(rows.into_iter().map(|r| r.get("key")).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_string_roundtrip_and_delete() {
        let store = SqliteSettingsStore::in_memory().await.unwrap();

        assert_eq!(store.get_string("integrations.dropbox.cursor").await.unwrap(), None);

        store
            .set_string("integrations.dropbox.cursor", "cursor-123")
            .await
            .unwrap();
        assert_eq!(
            store.get_string("integrations.dropbox.cursor").await.unwrap(),
            Some("cursor-123".to_string())
        );

        store.delete("integrations.dropbox.cursor").await.unwrap();
        assert!(!store.has_key("integrations.dropbox.cursor").await.unwrap());
    }

    #[tokio::test]
    async fn test_i64_roundtrip() {
        let store = SqliteSettingsStore::in_memory().await.unwrap();
        store.set_i64("last_run_at", 1_700_000_000).await.unwrap();
        assert_eq!(store.get_i64("last_run_at").await.unwrap(), Some(1_700_000_000));
    }
}
