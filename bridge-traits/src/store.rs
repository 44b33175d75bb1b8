//! Derived Object Store Abstraction
//!
//! Write-side interface to the store that holds derivatives (compressed
//! images, preserved video originals, transcode outputs). Keys are
//! slash-separated and content-addressed by the sync engine; concurrent
//! writes to the same key are expected to resolve last-writer-wins.

use async_trait::async_trait;
use bytes::Bytes;

use crate::error::Result;

/// Cache directive applied to derivative writes. Derivatives are immutable
/// once written, so the long-lived public directive is the default.
pub const IMMUTABLE_CACHE_CONTROL: &str = "public, max-age=31536000, immutable";

/// Object store write/delete/list operations.
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Write an object, replacing any existing object at `key`.
    async fn put(
        &self,
        key: &str,
        body: Bytes,
        content_type: &str,
        cache_control: &str,
    ) -> Result<()>;

    /// Write an object from an async byte stream without buffering it fully.
    ///
    /// Required for multi-GB video originals.
    async fn stream_put(
        &self,
        key: &str,
        body: Box<dyn tokio::io::AsyncRead + Send + Unpin>,
        content_type: &str,
        cache_control: &str,
    ) -> Result<()>;

    /// Delete the object at `key`. Deleting a missing key is not an error.
    async fn delete(&self, key: &str) -> Result<()>;

    /// List object keys under `prefix`.
    async fn list(&self, prefix: &str) -> Result<Vec<String>>;
}
