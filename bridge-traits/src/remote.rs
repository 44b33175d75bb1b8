//! Remote Tree Abstraction
//!
//! Platform-agnostic trait over the remote file-tree listing API: full
//! listing, incremental continuation via an opaque cursor, content download,
//! and temporary download URLs for streaming large files.

use async_trait::async_trait;
use bytes::Bytes;

use crate::error::Result;

/// The kind of change reported by a remote listing entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RemoteEntryKind {
    /// A file currently present in the remote tree.
    File,
    /// A folder entry. Carries no content id.
    Folder,
    /// A file that was removed from the remote tree.
    Deleted,
}

/// One change reported by the remote tree listing.
///
/// The remote system case-normalizes `path_lower`; it is only valid for
/// comparisons. `path_display` preserves the original casing and is the only
/// field suitable for constructing output keys.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteEntry {
    /// Change kind.
    pub kind: RemoteEntryKind,
    /// Slash-rooted path, case-normalized by the remote system.
    pub path_lower: String,
    /// Slash-rooted path with original casing preserved.
    pub path_display: String,
    /// Opaque stable content identifier. Present for `File`, absent otherwise.
    pub id: Option<String>,
    /// File size in bytes, when reported.
    pub size: Option<u64>,
    /// Server-side modification time (Unix timestamp), when reported.
    pub server_modified: Option<i64>,
    /// Remote content hash, when reported.
    pub content_hash: Option<String>,
}

impl RemoteEntry {
    /// Create a file entry. Test and connector helper.
    pub fn file(id: impl Into<String>, path_display: impl Into<String>) -> Self {
        let display = path_display.into();
        Self {
            kind: RemoteEntryKind::File,
            path_lower: display.to_lowercase(),
            path_display: display,
            id: Some(id.into()),
            size: None,
            server_modified: None,
            content_hash: None,
        }
    }

    /// Create a deletion entry.
    pub fn deleted(path_display: impl Into<String>) -> Self {
        let display = path_display.into();
        Self {
            kind: RemoteEntryKind::Deleted,
            path_lower: display.to_lowercase(),
            path_display: display,
            id: None,
            size: None,
            server_modified: None,
            content_hash: None,
        }
    }

    /// Create a folder entry.
    pub fn folder(path_display: impl Into<String>) -> Self {
        let display = path_display.into();
        Self {
            kind: RemoteEntryKind::Folder,
            path_lower: display.to_lowercase(),
            path_display: display,
            id: None,
            size: None,
            server_modified: None,
            content_hash: None,
        }
    }
}

/// One page of a remote listing.
#[derive(Debug, Clone)]
pub struct ListPage {
    /// Entries reported on this page.
    pub entries: Vec<RemoteEntry>,
    /// Continuation cursor issued by the remote system.
    pub cursor: Option<String>,
    /// Whether another page is available behind `cursor`.
    pub has_more: bool,
}

impl ListPage {
    /// An empty terminal page (used when the remote folder does not exist yet).
    pub fn empty() -> Self {
        Self {
            entries: Vec::new(),
            cursor: None,
            has_more: false,
        }
    }
}

/// Remote file-tree access trait
///
/// Implementations wrap a provider's listing API. Error contract:
/// - `BridgeError::NotFound` when the listed path does not exist remotely
/// - `BridgeError::CursorReset` when a continuation cursor is invalid/expired
///
/// Both conditions are load-bearing for the sync engine and must not be
/// collapsed into generic failures.
#[async_trait]
pub trait RemoteTree: Send + Sync {
    /// List a folder from scratch, returning the first page and a cursor.
    ///
    /// `path` is the provider-native root: the empty string for app-scoped
    /// integrations, an explicit slash-rooted path otherwise.
    async fn list_folder(&self, path: &str, recursive: bool) -> Result<ListPage>;

    /// Continue a listing from a previously issued cursor.
    async fn list_folder_continue(&self, cursor: &str) -> Result<ListPage>;

    /// Download a file's current content by its content identifier.
    async fn download(&self, content_id: &str) -> Result<Bytes>;

    /// Obtain a short-lived direct download URL for streaming transfers.
    async fn temporary_download_url(&self, content_id: &str) -> Result<String>;
}
