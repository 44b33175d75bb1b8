//! # Path Normalization & Content Classification
//!
//! Maps remote listing paths into canonical derived-store keys and classifies
//! entries by media type. Two root-folder conventions are supported:
//!
//! - **Team root**: the configured folder path names an explicit shared tree
//!   (e.g. `0 US/smith`); listing paths may or may not already carry it.
//! - **App root**: the configured folder path starts with `Apps`; the remote
//!   API lists from the empty-string root and derived keys are prefixed with
//!   `Apps/<appName>`.
//!
//! Everything in this module is pure and deterministic. Normalization is
//! idempotent: feeding a derived key back through yields the same key, never
//! a double prefix. Path comparisons are case-insensitive, but the original
//! casing of the remainder is always preserved in output keys.

use serde::{Deserialize, Serialize};

use crate::error::{Result, SyncError};

/// Extensions classified as images.
const IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "gif", "webp", "heic", "heif"];

/// Extensions classified as videos.
const VIDEO_EXTENSIONS: &[&str] = &["mp4", "mov", "m4v", "avi", "mkv"];

/// Media classification of a normalized path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaType {
    Image,
    Video,
    Ignored,
}

impl MediaType {
    /// Classify a path by extension, case-insensitively.
    pub fn classify(path: &str) -> Self {
        let ext = match extension_of(path) {
            Some(ext) => ext.to_ascii_lowercase(),
            None => return Self::Ignored,
        };

        if IMAGE_EXTENSIONS.contains(&ext.as_str()) {
            Self::Image
        } else if VIDEO_EXTENSIONS.contains(&ext.as_str()) {
            Self::Video
        } else {
            Self::Ignored
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Image => "image",
            Self::Video => "video",
            Self::Ignored => "ignored",
        }
    }
}

impl std::fmt::Display for MediaType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Root-folder convention in effect for a sync run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RootStyle {
    /// Shared team tree addressed by an explicit path.
    TeamRoot,
    /// App-scoped folder; the remote API root is the empty string.
    AppRoot,
}

/// Resolved root mapping for one sync run.
///
/// Resolved from the single persisted folder-path setting at the start of
/// every run; never cached across runs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RootMapping {
    pub style: RootStyle,
    /// Canonical derived-store prefix, e.g. `0 US/smith` or
    /// `Apps/stone-development`.
    pub derived_prefix: String,
    /// Provider-native listing root: empty string for `AppRoot`, a
    /// slash-rooted path for `TeamRoot`.
    pub api_root: String,
    /// The cleaned configured folder path, carried on work items so
    /// consumers never re-resolve it.
    pub owner_scope: String,
}

impl RootMapping {
    /// Resolve the mapping from the configured folder path.
    ///
    /// The style is inferred by testing whether the path begins with the
    /// app-root literal, case-insensitively. Exactly one style is active.
    pub fn resolve(folder_path: &str) -> Result<Self> {
        let clean = folder_path.trim().trim_matches('/');
        if clean.is_empty() {
            return Err(SyncError::Config(
                "Folder path cannot be empty".to_string(),
            ));
        }

        let is_app_root = clean.eq_ignore_ascii_case("apps")
            || clean
                .get(..5)
                .is_some_and(|head| head.eq_ignore_ascii_case("apps/"));

        if is_app_root {
            let app_name = clean
                .get(4..)
                .unwrap_or("")
                .trim_start_matches('/')
                .to_string();
            if app_name.is_empty() {
                return Err(SyncError::Config(
                    "App folder path must name an app, e.g. Apps/<appName>".to_string(),
                ));
            }

            Ok(Self {
                style: RootStyle::AppRoot,
                derived_prefix: format!("Apps/{}", app_name),
                // The remote API expects the empty string as the app root,
                // not "/".
                api_root: String::new(),
                owner_scope: clean.to_string(),
            })
        } else {
            Ok(Self {
                style: RootStyle::TeamRoot,
                derived_prefix: clean.to_string(),
                api_root: format!("/{}", clean),
                owner_scope: clean.to_string(),
            })
        }
    }
}

/// Canonical derived-store addressing for one entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NormalizedTarget {
    pub derived_key: String,
    pub media_type: MediaType,
}

/// Strip `prefix` from the start of `s` case-insensitively, requiring a
/// segment boundary after it. Returns the remainder (with its leading `/`).
fn strip_prefix_ci<'a>(s: &'a str, prefix: &str) -> Option<&'a str> {
    let head = s.get(..prefix.len())?;
    if !head.eq_ignore_ascii_case(prefix) {
        return None;
    }
    let tail = &s[prefix.len()..];
    if tail.is_empty() || tail.starts_with('/') {
        Some(tail)
    } else {
        None
    }
}

/// Normalize a remote path into its canonical derived-store target.
///
/// Pass the display-cased path; the prefix match is case-insensitive but the
/// remainder's casing is preserved. Idempotent: an already-canonical key maps
/// to itself.
pub fn normalize(native_path: &str, mapping: &RootMapping) -> NormalizedTarget {
    let stripped = native_path.trim_start_matches('/');

    let derived_key = match strip_prefix_ci(stripped, &mapping.derived_prefix) {
        // Already carries the prefix: re-canonicalize only its casing.
        Some(rest) => format!("{}{}", mapping.derived_prefix, rest),
        None => format!("{}/{}", mapping.derived_prefix, stripped),
    };

    let media_type = MediaType::classify(&derived_key);
    NormalizedTarget {
        derived_key,
        media_type,
    }
}

/// The extension of a key's final segment, without the dot.
pub fn extension_of(key: &str) -> Option<&str> {
    let file = key.rsplit('/').next().unwrap_or(key);
    match file.rfind('.') {
        Some(0) | None => None,
        Some(idx) => Some(&file[idx + 1..]),
    }
}

/// Split a key into its directory (without trailing slash) and the final
/// segment's stem (without extension).
pub fn split_key(key: &str) -> (&str, &str) {
    let (dir, file) = match key.rsplit_once('/') {
        Some((dir, file)) => (dir, file),
        None => ("", key),
    };
    let stem = match file.rfind('.') {
        Some(0) | None => file,
        Some(idx) => &file[..idx],
    };
    (dir, stem)
}

/// The canonical `.jpg` key an image derivative is written under (and the
/// target of derived-store deletions), regardless of the source extension.
pub fn derived_jpg_key(key: &str) -> String {
    let (dir, stem) = split_key(key);
    if dir.is_empty() {
        format!("{}.jpg", stem)
    } else {
        format!("{}/{}.jpg", dir, stem)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn team_mapping() -> RootMapping {
        RootMapping::resolve("0 US/smith").unwrap()
    }

    fn app_mapping() -> RootMapping {
        RootMapping::resolve("Apps/stone-development").unwrap()
    }

    #[test]
    fn test_classify_all_image_extensions_case_varied() {
        for ext in ["jpg", "JPG", "jpeg", "Png", "GIF", "webp", "HeIc", "heif"] {
            let path = format!("/album/photo.{}", ext);
            assert_eq!(MediaType::classify(&path), MediaType::Image, "{}", ext);
        }
    }

    #[test]
    fn test_classify_all_video_extensions_case_varied() {
        for ext in ["mp4", "MP4", "MoV", "m4v", "AVI", "mkv"] {
            let path = format!("/album/clip.{}", ext);
            assert_eq!(MediaType::classify(&path), MediaType::Video, "{}", ext);
        }
    }

    #[test]
    fn test_classify_everything_else_ignored() {
        for path in [
            "/notes.txt",
            "/archive.zip",
            "/album/raw.CR2",
            "/noextension",
            "/.hidden",
            "/trailingdot.",
        ] {
            assert_eq!(MediaType::classify(path), MediaType::Ignored, "{}", path);
        }
    }

    #[test]
    fn test_resolve_team_root() {
        let mapping = team_mapping();
        assert_eq!(mapping.style, RootStyle::TeamRoot);
        assert_eq!(mapping.derived_prefix, "0 US/smith");
        assert_eq!(mapping.api_root, "/0 US/smith");
        assert_eq!(mapping.owner_scope, "0 US/smith");
    }

    #[test]
    fn test_resolve_app_root_case_insensitive() {
        for configured in ["Apps/stone-development", "/apps/stone-development/", "APPS/stone-development"] {
            let mapping = RootMapping::resolve(configured).unwrap();
            assert_eq!(mapping.style, RootStyle::AppRoot, "{}", configured);
            assert_eq!(mapping.derived_prefix, "Apps/stone-development");
            assert_eq!(mapping.api_root, "");
        }
    }

    #[test]
    fn test_resolve_rejects_empty_and_bare_apps() {
        assert!(RootMapping::resolve("").is_err());
        assert!(RootMapping::resolve("  /  ").is_err());
        assert!(RootMapping::resolve("Apps").is_err());
        assert!(RootMapping::resolve("Apps/").is_err());
    }

    #[test]
    fn test_team_path_without_prefix_is_prepended() {
        let target = normalize("/a/b.jpg", &team_mapping());
        assert_eq!(target.derived_key, "0 US/smith/a/b.jpg");
        assert_eq!(target.media_type, MediaType::Image);
    }

    #[test]
    fn test_team_path_with_lowercased_prefix_is_recanonicalized() {
        // The remote reports "/0 us/smith/..." in path_lower form; only the
        // prefix casing is repaired, the remainder keeps its casing.
        let target = normalize("/0 us/smith/Trip/IMG_01.JPG", &team_mapping());
        assert_eq!(target.derived_key, "0 US/smith/Trip/IMG_01.JPG");
    }

    #[test]
    fn test_normalize_is_idempotent() {
        for (mapping, input) in [
            (team_mapping(), "/a/b.jpg"),
            (team_mapping(), "/0 US/smith/a/b.jpg"),
            (app_mapping(), "/album/pic.png"),
            (app_mapping(), "/Apps/stone-development/album/pic.png"),
        ] {
            let once = normalize(input, &mapping);
            let twice = normalize(&once.derived_key, &mapping);
            assert_eq!(once.derived_key, twice.derived_key, "{}", input);
        }
    }

    #[test]
    fn test_no_double_prefix_on_similar_segment() {
        // "0 US/smithson/..." must not be mistaken for the "0 US/smith" prefix.
        let target = normalize("/0 US/smithson/a.jpg", &team_mapping());
        assert_eq!(target.derived_key, "0 US/smith/0 US/smithson/a.jpg");
    }

    #[test]
    fn test_app_root_prefixes_relative_paths() {
        // App-scoped listings report paths relative to the app folder.
        let target = normalize("/album/pic.jpg", &app_mapping());
        assert_eq!(target.derived_key, "Apps/stone-development/album/pic.jpg");
    }

    #[test]
    fn test_derived_jpg_key_replaces_source_extension() {
        assert_eq!(
            derived_jpg_key("0 US/smith/a/photo.HEIC"),
            "0 US/smith/a/photo.jpg"
        );
        assert_eq!(derived_jpg_key("photo.png"), "photo.jpg");
        assert_eq!(derived_jpg_key("dir.v2/clip"), "dir.v2/clip.jpg");
    }

    #[test]
    fn test_split_key_and_extension() {
        assert_eq!(split_key("a/b/c.jpeg"), ("a/b", "c"));
        assert_eq!(split_key("c.jpeg"), ("", "c"));
        assert_eq!(extension_of("a/b/c.JPeG"), Some("JPeG"));
        assert_eq!(extension_of("a/b.dir/c"), None);
    }
}
