//! # Cursor Store
//!
//! Durable, single-slot persisted position in the remote change stream.
//!
//! ## Overview
//!
//! One integration per deployment means one global cursor slot. The cursor is
//! read at run start, advanced exactly once per fully dispatched page, and
//! cleared when the remote system reports it invalid (forcing the next run to
//! perform a full listing). Only the orchestrating run writes it.

use async_trait::async_trait;
use bridge_traits::settings::SettingsStore;
use std::sync::Arc;
use tracing::debug;

use crate::error::{Result, SyncError};

/// Settings key holding the persisted cursor.
pub const CURSOR_KEY: &str = "integrations.dropbox.cursor";

/// Settings key holding the configured folder path.
pub const FOLDER_PATH_KEY: &str = "integrations.dropbox.folder_path";

/// Durable single-slot cursor persistence.
#[async_trait]
pub trait CursorStore: Send + Sync {
    /// Read the stored cursor. `None` means start-of-history.
    async fn load(&self) -> Result<Option<String>>;

    /// Persist a new cursor value.
    async fn save(&self, cursor: &str) -> Result<()>;

    /// Clear the stored cursor, forcing the next run to full-list.
    async fn clear(&self) -> Result<()>;
}

/// Cursor store backed by the integration settings record.
pub struct SettingsCursorStore {
    settings: Arc<dyn SettingsStore>,
}

impl SettingsCursorStore {
    pub fn new(settings: Arc<dyn SettingsStore>) -> Self {
        Self { settings }
    }
}

#[async_trait]
impl CursorStore for SettingsCursorStore {
    async fn load(&self) -> Result<Option<String>> {
        self.settings
            .get_string(CURSOR_KEY)
            .await
            .map_err(|e| SyncError::Store(e.to_string()))
    }

    async fn save(&self, cursor: &str) -> Result<()> {
        self.settings
            .set_string(CURSOR_KEY, cursor)
            .await
            .map_err(|e| SyncError::Store(e.to_string()))?;
        debug!("Advanced sync cursor");
        Ok(())
    }

    async fn clear(&self) -> Result<()> {
        self.settings
            .delete(CURSOR_KEY)
            .await
            .map_err(|e| SyncError::Store(e.to_string()))?;
        debug!("Cleared sync cursor");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bridge_traits::error::Result as BridgeResult;
    use std::collections::HashMap;
    use tokio::sync::Mutex;

    #[derive(Default)]
    struct MemorySettings {
        data: Mutex<HashMap<String, String>>,
    }

    #[async_trait]
    impl SettingsStore for MemorySettings {
        async fn set_string(&self, key: &str, value: &str) -> BridgeResult<()> {
            self.data
                .lock()
                .await
                .insert(key.to_string(), value.to_string());
            Ok(())
        }

        async fn get_string(&self, key: &str) -> BridgeResult<Option<String>> {
            Ok(self.data.lock().await.get(key).cloned())
        }

        async fn set_i64(&self, key: &str, value: i64) -> BridgeResult<()> {
            self.set_string(key, &value.to_string()).await
        }

        async fn get_i64(&self, key: &str) -> BridgeResult<Option<i64>> {
            Ok(self
                .data
                .lock()
                .await
                .get(key)
                .and_then(|v| v.parse().ok()))
        }

        async fn delete(&self, key: &str) -> BridgeResult<()> {
            self.data.lock().await.remove(key);
            Ok(())
        }

        async fn has_key(&self, key: &str) -> BridgeResult<bool> {
            Ok(self.data.lock().await.contains_key(key))
        }

        async fn list_keys(&self) -> BridgeResult<Vec<String>> {
            Ok(self.data.lock().await.keys().cloned().collect())
        }
    }

    #[tokio::test]
    async fn test_load_save_clear_cycle() {
        let store = SettingsCursorStore::new(Arc::new(MemorySettings::default()));

        assert_eq!(store.load().await.unwrap(), None);

        store.save("cursor-1").await.unwrap();
        assert_eq!(store.load().await.unwrap(), Some("cursor-1".to_string()));

        store.save("cursor-2").await.unwrap();
        assert_eq!(store.load().await.unwrap(), Some("cursor-2".to_string()));

        store.clear().await.unwrap();
        assert_eq!(store.load().await.unwrap(), None);
    }
}
