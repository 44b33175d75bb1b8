//! Filesystem-backed Object Store
//!
//! Maps object keys onto a directory tree under a configured root. Content
//! type and cache directives are accepted for interface parity with remote
//! stores but are not persisted by the filesystem backend.

use async_trait::async_trait;
use bridge_traits::{
    error::{BridgeError, Result},
    store::ObjectStore,
};
use bytes::Bytes;
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tracing::debug;

/// Object store rooted at a local directory.
pub struct FsObjectStore {
    root: PathBuf,
}

impl FsObjectStore {
    /// Create a store rooted at `root`. The directory is created lazily on
    /// first write.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Resolve a key to a path under the root, rejecting traversal segments.
    fn resolve(&self, key: &str) -> Result<PathBuf> {
        let key = key.trim_start_matches('/');
        if key.is_empty() {
            return Err(BridgeError::OperationFailed(
                "Object key cannot be empty".to_string(),
            ));
        }
        if key.split('/').any(|seg| seg == "..") {
            return Err(BridgeError::OperationFailed(format!(
                "Object key must not contain traversal segments: {}",
                key
            )));
        }
        Ok(self.root.join(key))
    }

    async fn ensure_parent(path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).await.map_err(BridgeError::Io)?;
        }
        Ok(())
    }

    fn relative_key(&self, path: &Path) -> Option<String> {
        path.strip_prefix(&self.root)
            .ok()
            .map(|p| p.to_string_lossy().replace('\\', "/"))
    }
}

#[async_trait]
impl ObjectStore for FsObjectStore {
    async fn put(
        &self,
        key: &str,
        body: Bytes,
        _content_type: &str,
        _cache_control: &str,
    ) -> Result<()> {
        let path = self.resolve(key)?;
        Self::ensure_parent(&path).await?;
        fs::write(&path, &body).await.map_err(BridgeError::Io)?;
        debug!(key = %key, bytes = body.len(), "Stored object");
        Ok(())
    }

    async fn stream_put(
        &self,
        key: &str,
        mut body: Box<dyn tokio::io::AsyncRead + Send + Unpin>,
        _content_type: &str,
        _cache_control: &str,
    ) -> Result<()> {
        let path = self.resolve(key)?;
        Self::ensure_parent(&path).await?;

        let mut file = fs::File::create(&path).await.map_err(BridgeError::Io)?;
        let written = tokio::io::copy(&mut body, &mut file)
            .await
            .map_err(BridgeError::Io)?;
        file.flush().await.map_err(BridgeError::Io)?;
        debug!(key = %key, bytes = written, "Streamed object");
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<()> {
        let path = self.resolve(key)?;
        match fs::remove_file(&path).await {
            Ok(()) => {
                debug!(key = %key, "Deleted object");
                Ok(())
            }
            // Deleting a missing key is not an error.
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(BridgeError::Io(e)),
        }
    }

    async fn list(&self, prefix: &str) -> Result<Vec<String>> {
        let mut keys = Vec::new();
        if !fs::try_exists(&self.root).await.map_err(BridgeError::Io)? {
            return Ok(keys);
        }

        let mut stack = vec![self.root.clone()];
        while let Some(dir) = stack.pop() {
            let mut entries = fs::read_dir(&dir).await.map_err(BridgeError::Io)?;
            while let Some(entry) = entries.next_entry().await.map_err(BridgeError::Io)? {
                let path = entry.path();
                let file_type = entry.file_type().await.map_err(BridgeError::Io)?;
                if file_type.is_dir() {
                    stack.push(path);
                } else if let Some(key) = self.relative_key(&path) {
                    if key.starts_with(prefix) {
                        keys.push(key);
                    }
                }
            }
        }

        keys.sort();
        Ok(keys)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bridge_traits::store::IMMUTABLE_CACHE_CONTROL;
    use uuid::Uuid;

    fn temp_store() -> (FsObjectStore, PathBuf) {
        let root = std::env::temp_dir().join(format!("mirror-store-{}", Uuid::new_v4()));
        (FsObjectStore::new(root.clone()), root)
    }

    #[tokio::test]
    async fn test_put_list_delete_roundtrip() {
        let (store, root) = temp_store();

        store
            .put(
                "0 US/smith/a/b.jpg",
                Bytes::from_static(b"jpeg-bytes"),
                "image/jpeg",
                IMMUTABLE_CACHE_CONTROL,
            )
            .await
            .unwrap();

        let keys = store.list("0 US/smith/").await.unwrap();
        assert_eq!(keys, vec!["0 US/smith/a/b.jpg".to_string()]);

        store.delete("0 US/smith/a/b.jpg").await.unwrap();
        assert!(store.list("0 US/smith/").await.unwrap().is_empty());

        // Deleting again must not fail.
        store.delete("0 US/smith/a/b.jpg").await.unwrap();

        let _ = fs::remove_dir_all(&root).await;
    }

    #[tokio::test]
    async fn test_stream_put_writes_full_body() {
        let (store, root) = temp_store();

        let reader: Box<dyn tokio::io::AsyncRead + Send + Unpin> =
            Box::new(std::io::Cursor::new(b"streamed-video-bytes".to_vec()));
        store
            .stream_put("Apps/demo/v.mp4", reader, "video/mp4", IMMUTABLE_CACHE_CONTROL)
            .await
            .unwrap();

        let stored = fs::read(root.join("Apps/demo/v.mp4")).await.unwrap();
        assert_eq!(stored, b"streamed-video-bytes");

        let _ = fs::remove_dir_all(&root).await;
    }

    #[tokio::test]
    async fn test_rejects_traversal_keys() {
        let (store, _root) = temp_store();
        let result = store
            .put(
                "../escape.jpg",
                Bytes::new(),
                "image/jpeg",
                IMMUTABLE_CACHE_CONTROL,
            )
            .await;
        assert!(result.is_err());
    }
}
