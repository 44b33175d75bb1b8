//! # Dispatch Policy
//!
//! Routes each classified, normalized change to direct synchronous
//! processing or to the durable work queue.
//!
//! ## Overview
//!
//! Inline processing is bounded by the caller's wall-clock budget and memory;
//! queued processing runs in a separate execution context with automatic
//! retry and no such bound. The policy therefore prefers the queue whenever
//! one is configured, allows images inline as the fallback, and refuses to
//! process video without a queue (a transcode cannot be bounded within a
//! synchronous request lifetime).

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::path::{derived_jpg_key, normalize, MediaType, RootMapping};
use bridge_traits::remote::{RemoteEntry, RemoteEntryKind};

/// Work item priority. Defaults to `Normal` when absent from the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    Normal,
    Low,
}

/// The unit of derivative work, either processed inline or serialized onto
/// the durable queue.
///
/// Self-contained: the consumer never re-lists or re-resolves the root
/// mapping; all addressing is resolved at enqueue time. Field names on the
/// wire are stable for compatibility between independently deployed producer
/// and consumer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkItem {
    /// Opaque stable content identifier from the remote system.
    #[serde(rename = "dropboxId")]
    pub content_id: String,

    /// Slash-rooted remote path, original casing.
    #[serde(rename = "path")]
    pub native_path: String,

    /// Media classification; only `image` and `video` appear on the wire.
    #[serde(rename = "type")]
    pub media_type: MediaType,

    /// The root-mapping context the item was resolved under.
    #[serde(rename = "userFolderPath")]
    pub owner_scope: String,

    /// Destination key prefix in the derived store.
    #[serde(rename = "s3Key")]
    pub derived_key: String,

    /// Enqueue time, RFC 3339.
    #[serde(rename = "timestamp", default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<String>,

    #[serde(rename = "priority", default, skip_serializing_if = "Option::is_none")]
    pub priority: Option<Priority>,
}

/// The action the dispatcher decided for one entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    /// Publish the item to the durable queue.
    Enqueue(WorkItem),
    /// Produce the derivative in the current execution context.
    ProcessInline(WorkItem),
    /// Nothing to do for this entry.
    Skip,
    /// Remove the derived artifact for a remotely deleted file.
    DeleteDerived { derived_key: String },
}

/// Dispatch policy for one sync run.
#[derive(Debug, Clone, Copy)]
pub struct DispatchPolicy {
    queue_configured: bool,
}

impl DispatchPolicy {
    pub fn new(queue_configured: bool) -> Self {
        Self { queue_configured }
    }

    /// Decide the action for a remote entry under the active root mapping.
    pub fn decide(&self, entry: &RemoteEntry, mapping: &RootMapping) -> Action {
        match entry.kind {
            RemoteEntryKind::Folder => Action::Skip,

            RemoteEntryKind::Deleted => {
                let target = normalize(&entry.path_display, mapping);
                match target.media_type {
                    // Images are written under the canonical .jpg key, so
                    // that is what deletion targets.
                    MediaType::Image => Action::DeleteDerived {
                        derived_key: derived_jpg_key(&target.derived_key),
                    },
                    // Video derivative deletion is out of scope; the stored
                    // original and renditions are left in place.
                    MediaType::Video => {
                        debug!(path = %entry.path_lower, "Skipping derivative deletion for video");
                        Action::Skip
                    }
                    MediaType::Ignored => Action::Skip,
                }
            }

            RemoteEntryKind::File => {
                let target = normalize(&entry.path_display, mapping);
                if target.media_type == MediaType::Ignored {
                    debug!(path = %entry.path_lower, "Skipping non-media file");
                    return Action::Skip;
                }

                let content_id = match &entry.id {
                    Some(id) => id.clone(),
                    None => {
                        warn!(path = %entry.path_lower, "File entry without content id, skipping");
                        return Action::Skip;
                    }
                };

                let item = WorkItem {
                    content_id,
                    native_path: entry.path_display.clone(),
                    media_type: target.media_type,
                    owner_scope: mapping.owner_scope.clone(),
                    derived_key: target.derived_key,
                    timestamp: None,
                    priority: None,
                };

                if self.queue_configured {
                    Action::Enqueue(item)
                } else if item.media_type == MediaType::Image {
                    Action::ProcessInline(item)
                } else {
                    // Video derivative production is not boundable within a
                    // synchronous request lifetime.
                    warn!(
                        path = %entry.path_lower,
                        "Video requires the queue path and no queue is configured, skipping"
                    );
                    Action::Skip
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mapping() -> RootMapping {
        RootMapping::resolve("0 US/smith").unwrap()
    }

    #[test]
    fn test_ignored_and_folder_entries_skip() {
        let policy = DispatchPolicy::new(true);
        assert_eq!(
            policy.decide(&RemoteEntry::folder("/a"), &mapping()),
            Action::Skip
        );
        assert_eq!(
            policy.decide(&RemoteEntry::file("id:1", "/a/notes.txt"), &mapping()),
            Action::Skip
        );
    }

    #[test]
    fn test_queue_configured_enqueues_images_and_videos() {
        let policy = DispatchPolicy::new(true);

        match policy.decide(&RemoteEntry::file("id:1", "/a/b.jpg"), &mapping()) {
            Action::Enqueue(item) => {
                assert_eq!(item.content_id, "id:1");
                assert_eq!(item.media_type, MediaType::Image);
                assert_eq!(item.derived_key, "0 US/smith/a/b.jpg");
                assert_eq!(item.owner_scope, "0 US/smith");
            }
            other => panic!("expected Enqueue, got {:?}", other),
        }

        assert!(matches!(
            policy.decide(&RemoteEntry::file("id:2", "/a/v.mp4"), &mapping()),
            Action::Enqueue(_)
        ));
    }

    #[test]
    fn test_no_queue_images_inline_videos_skip() {
        let policy = DispatchPolicy::new(false);

        assert!(matches!(
            policy.decide(&RemoteEntry::file("id:1", "/a/b.jpg"), &mapping()),
            Action::ProcessInline(_)
        ));
        assert_eq!(
            policy.decide(&RemoteEntry::file("id:2", "/a/v.mp4"), &mapping()),
            Action::Skip
        );
    }

    #[test]
    fn test_deletion_targets_derived_jpg_key() {
        let policy = DispatchPolicy::new(true);

        match policy.decide(&RemoteEntry::deleted("/a/photo.HEIC"), &mapping()) {
            Action::DeleteDerived { derived_key } => {
                assert_eq!(derived_key, "0 US/smith/a/photo.jpg");
            }
            other => panic!("expected DeleteDerived, got {:?}", other),
        }

        // Video derivative deletion is a no-op.
        assert_eq!(
            policy.decide(&RemoteEntry::deleted("/a/clip.mp4"), &mapping()),
            Action::Skip
        );
    }

    #[test]
    fn test_file_without_content_id_skips() {
        let policy = DispatchPolicy::new(true);
        let mut entry = RemoteEntry::file("id:1", "/a/b.jpg");
        entry.id = None;
        assert_eq!(policy.decide(&entry, &mapping()), Action::Skip);
    }

    #[test]
    fn test_wire_shape_is_stable() {
        let item = WorkItem {
            content_id: "id:1".to_string(),
            native_path: "/a/b.jpg".to_string(),
            media_type: MediaType::Image,
            owner_scope: "0 US/smith".to_string(),
            derived_key: "0 US/smith/a/b.jpg".to_string(),
            timestamp: Some("2024-06-01T12:00:00Z".to_string()),
            priority: Some(Priority::Normal),
        };

        let json: serde_json::Value = serde_json::to_value(&item).unwrap();
        assert_eq!(json["dropboxId"], "id:1");
        assert_eq!(json["path"], "/a/b.jpg");
        assert_eq!(json["type"], "image");
        assert_eq!(json["userFolderPath"], "0 US/smith");
        assert_eq!(json["s3Key"], "0 US/smith/a/b.jpg");
        assert_eq!(json["priority"], "normal");

        let parsed: WorkItem = serde_json::from_value(json).unwrap();
        assert_eq!(parsed, item);
    }

    #[test]
    fn test_optional_fields_absent_from_wire() {
        let item = WorkItem {
            content_id: "id:1".to_string(),
            native_path: "/a/v.mov".to_string(),
            media_type: MediaType::Video,
            owner_scope: "0 US/smith".to_string(),
            derived_key: "0 US/smith/a/v.MOV".to_string(),
            timestamp: None,
            priority: None,
        };

        let json = serde_json::to_string(&item).unwrap();
        assert!(!json.contains("timestamp"));
        assert!(!json.contains("priority"));
    }
}
