//! Dropbox API response types
//!
//! Data structures for the Dropbox API v2 RPC endpoints used by the
//! connector.

use serde::{Deserialize, Serialize};

/// Arguments for `files/list_folder`.
///
/// `path` is the empty string for app-scoped integrations (the API rejects
/// `"/"` as a root) and an explicit slash-rooted path otherwise.
#[derive(Debug, Clone, Serialize)]
pub struct ListFolderArgs {
    pub path: String,
    pub recursive: bool,
    pub include_non_downloadable_files: bool,
}

/// Arguments for `files/list_folder/continue`.
#[derive(Debug, Clone, Serialize)]
pub struct ListFolderContinueArgs {
    pub cursor: String,
}

/// Arguments for `files/get_temporary_link` and `files/download`.
#[derive(Debug, Clone, Serialize)]
pub struct PathArg {
    pub path: String,
}

/// One entry in a listing response, discriminated by the `.tag` field.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = ".tag", rename_all = "lowercase")]
pub enum EntryMetadata {
    File(FileMetadata),
    Folder(FolderMetadata),
    Deleted(DeletedMetadata),
}

/// A file currently present in the remote tree.
#[derive(Debug, Clone, Deserialize)]
pub struct FileMetadata {
    pub id: String,
    pub name: String,
    pub path_lower: String,
    pub path_display: String,
    #[serde(default)]
    pub size: Option<u64>,
    /// RFC 3339 server-side modification time.
    #[serde(default)]
    pub server_modified: Option<String>,
    #[serde(default)]
    pub content_hash: Option<String>,
}

/// A folder entry.
#[derive(Debug, Clone, Deserialize)]
pub struct FolderMetadata {
    pub name: String,
    pub path_lower: String,
    pub path_display: String,
}

/// A file or folder removed from the remote tree.
#[derive(Debug, Clone, Deserialize)]
pub struct DeletedMetadata {
    pub name: String,
    pub path_lower: String,
    pub path_display: String,
}

/// Response shape shared by `files/list_folder` and its continuation.
#[derive(Debug, Clone, Deserialize)]
pub struct ListFolderResponse {
    pub entries: Vec<EntryMetadata>,
    pub cursor: String,
    pub has_more: bool,
}

/// Response from `files/get_temporary_link`.
#[derive(Debug, Clone, Deserialize)]
pub struct TemporaryLinkResponse {
    pub link: String,
}

/// Error body returned with HTTP 409 responses.
#[derive(Debug, Clone, Deserialize)]
pub struct ApiErrorResponse {
    pub error_summary: String,
    #[serde(default)]
    pub error: Option<ErrorDetail>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ErrorDetail {
    #[serde(rename = ".tag")]
    pub tag: Option<String>,
    #[serde(default)]
    pub path: Option<PathErrorDetail>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PathErrorDetail {
    #[serde(rename = ".tag")]
    pub tag: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_entry_tag_discrimination() {
        let json = r#"{
            ".tag": "file",
            "id": "id:abc123",
            "name": "b.jpg",
            "path_lower": "/a/b.jpg",
            "path_display": "/A/B.jpg",
            "size": 1024,
            "server_modified": "2024-06-01T12:00:00Z"
        }"#;

        let entry: EntryMetadata = serde_json::from_str(json).unwrap();
        match entry {
            EntryMetadata::File(file) => {
                assert_eq!(file.id, "id:abc123");
                assert_eq!(file.path_display, "/A/B.jpg");
                assert_eq!(file.size, Some(1024));
            }
            _ => panic!("expected file entry"),
        }
    }

    #[test]
    fn test_deleted_entry_has_no_id() {
        let json = r#"{
            ".tag": "deleted",
            "name": "old.heic",
            "path_lower": "/a/old.heic",
            "path_display": "/A/old.HEIC"
        }"#;

        let entry: EntryMetadata = serde_json::from_str(json).unwrap();
        assert!(matches!(entry, EntryMetadata::Deleted(_)));
    }

    #[test]
    fn test_error_response_path_tag() {
        let json = r#"{
            "error_summary": "path/not_found/..",
            "error": {".tag": "path", "path": {".tag": "not_found"}}
        }"#;

        let err: ApiErrorResponse = serde_json::from_str(json).unwrap();
        let detail = err.error.unwrap();
        assert_eq!(detail.tag.as_deref(), Some("path"));
        assert_eq!(detail.path.unwrap().tag.as_deref(), Some("not_found"));
    }
}
