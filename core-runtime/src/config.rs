//! # Core Configuration Module
//!
//! Provides configuration for the media mirror core.
//!
//! ## Overview
//!
//! `MirrorConfig` holds the tuning knobs of a sync run: queue endpoint,
//! concurrency and timeout ceilings, and the derivative variant policy. It is
//! constructed through a builder with fail-fast validation so misconfiguration
//! surfaces at startup rather than mid-sync.
//!
//! Service handles (remote tree, object store, queue, transcode, settings)
//! are injected directly into the components that use them; this struct
//! carries values only.
//!
//! ## Usage
//!
//! ```ignore
//! use core_runtime::config::MirrorConfig;
//!
//! let config = MirrorConfig::builder()
//!     .queue_url("https://queue.example.com/media-derivatives")
//!     .max_concurrent_dispatch(8)
//!     .build()?;
//! ```

use crate::error::{Error, Result};

/// Sentinel left in sample environment files; treated as no queue configured.
const QUEUE_URL_PLACEHOLDER: &str = "your-queue";

/// Image derivative variant policy.
///
/// The single-compressed policy is authoritative for new deployments; the
/// multi-resolution policy reproduces the earlier width-variant output and
/// remains selectable for stores that still serve those keys.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VariantPolicy {
    /// One optimally compressed JPEG at the derived key.
    SingleCompressed,
    /// The compressed JPEG plus one `<stem>_w{width}.jpg` variant per width.
    MultiResolution { widths: Vec<u32> },
}

impl Default for VariantPolicy {
    fn default() -> Self {
        Self::SingleCompressed
    }
}

impl VariantPolicy {
    /// The historical width ladder used by multi-resolution deployments.
    pub fn legacy_widths() -> Vec<u32> {
        vec![480, 960, 1600]
    }
}

/// Configuration for the media mirror core.
#[derive(Debug, Clone)]
pub struct MirrorConfig {
    /// Durable queue endpoint. `None` (or a placeholder value) routes image
    /// work inline and skips video work.
    pub queue_url: Option<String>,

    /// Whether full listings recurse into subfolders.
    pub recursive: bool,

    /// Maximum concurrent dispatch actions within one listing page.
    pub max_concurrent_dispatch: usize,

    /// Timeout for an entire detached sync run (seconds).
    pub sync_timeout_secs: u64,

    /// Per-message processing ceiling on the consumer side (seconds).
    pub message_timeout_secs: u64,

    /// Maximum messages drained from the queue per consumer invocation.
    pub batch_size: u32,

    /// Maximum bounding box for image derivatives (pixels per side).
    pub image_max_dimension: u32,

    /// JPEG re-encode quality (1-100).
    pub jpeg_quality: u8,

    /// Image derivative variant policy.
    pub variant_policy: VariantPolicy,
}

impl Default for MirrorConfig {
    fn default() -> Self {
        Self {
            queue_url: None,
            recursive: true,
            max_concurrent_dispatch: 4,
            sync_timeout_secs: 3600,
            message_timeout_secs: 600,
            batch_size: 10,
            image_max_dimension: 3840,
            jpeg_quality: 85,
            variant_policy: VariantPolicy::SingleCompressed,
        }
    }
}

impl MirrorConfig {
    /// Creates a new builder for constructing a `MirrorConfig`.
    pub fn builder() -> MirrorConfigBuilder {
        MirrorConfigBuilder::default()
    }

    /// The effective queue endpoint, with unset and placeholder values
    /// collapsed to `None`.
    pub fn queue_endpoint(&self) -> Option<&str> {
        match self.queue_url.as_deref() {
            Some(url) if !url.is_empty() && !url.contains(QUEUE_URL_PLACEHOLDER) => Some(url),
            _ => None,
        }
    }

    /// Validates the configuration and returns an error if invalid.
    pub fn validate(&self) -> Result<()> {
        if self.max_concurrent_dispatch == 0 {
            return Err(Error::Config(
                "max_concurrent_dispatch must be greater than 0".to_string(),
            ));
        }

        if self.batch_size == 0 {
            return Err(Error::Config("batch_size must be greater than 0".to_string()));
        }

        if self.jpeg_quality == 0 || self.jpeg_quality > 100 {
            return Err(Error::Config(
                "jpeg_quality must be between 1 and 100".to_string(),
            ));
        }

        if self.image_max_dimension == 0 {
            return Err(Error::Config(
                "image_max_dimension must be greater than 0".to_string(),
            ));
        }

        if let VariantPolicy::MultiResolution { widths } = &self.variant_policy {
            if widths.is_empty() {
                return Err(Error::Config(
                    "MultiResolution variant policy requires at least one width".to_string(),
                ));
            }
            if widths.iter().any(|w| *w == 0) {
                return Err(Error::Config(
                    "MultiResolution widths must be greater than 0".to_string(),
                ));
            }
        }

        Ok(())
    }
}

/// Builder for constructing [`MirrorConfig`] instances.
#[derive(Default)]
pub struct MirrorConfigBuilder {
    queue_url: Option<String>,
    recursive: Option<bool>,
    max_concurrent_dispatch: Option<usize>,
    sync_timeout_secs: Option<u64>,
    message_timeout_secs: Option<u64>,
    batch_size: Option<u32>,
    image_max_dimension: Option<u32>,
    jpeg_quality: Option<u8>,
    variant_policy: Option<VariantPolicy>,
}

impl MirrorConfigBuilder {
    /// Sets the durable queue endpoint.
    pub fn queue_url(mut self, url: impl Into<String>) -> Self {
        self.queue_url = Some(url.into());
        self
    }

    /// Sets whether full listings recurse into subfolders. Default: true.
    pub fn recursive(mut self, recursive: bool) -> Self {
        self.recursive = Some(recursive);
        self
    }

    /// Sets the per-page dispatch concurrency. Default: 4.
    pub fn max_concurrent_dispatch(mut self, max: usize) -> Self {
        self.max_concurrent_dispatch = Some(max);
        self
    }

    /// Sets the run-level timeout in seconds. Default: 3600.
    pub fn sync_timeout_secs(mut self, secs: u64) -> Self {
        self.sync_timeout_secs = Some(secs);
        self
    }

    /// Sets the per-message consumer timeout in seconds. Default: 600.
    pub fn message_timeout_secs(mut self, secs: u64) -> Self {
        self.message_timeout_secs = Some(secs);
        self
    }

    /// Sets the consumer batch size. Default: 10.
    pub fn batch_size(mut self, size: u32) -> Self {
        self.batch_size = Some(size);
        self
    }

    /// Sets the image bounding box in pixels. Default: 3840.
    pub fn image_max_dimension(mut self, pixels: u32) -> Self {
        self.image_max_dimension = Some(pixels);
        self
    }

    /// Sets the JPEG re-encode quality. Default: 85.
    pub fn jpeg_quality(mut self, quality: u8) -> Self {
        self.jpeg_quality = Some(quality);
        self
    }

    /// Sets the image variant policy. Default: single compressed JPEG.
    pub fn variant_policy(mut self, policy: VariantPolicy) -> Self {
        self.variant_policy = Some(policy);
        self
    }

    /// Builds the final `MirrorConfig`, validating all values.
    pub fn build(self) -> Result<MirrorConfig> {
        let defaults = MirrorConfig::default();
        let config = MirrorConfig {
            queue_url: self.queue_url,
            recursive: self.recursive.unwrap_or(defaults.recursive),
            max_concurrent_dispatch: self
                .max_concurrent_dispatch
                .unwrap_or(defaults.max_concurrent_dispatch),
            sync_timeout_secs: self.sync_timeout_secs.unwrap_or(defaults.sync_timeout_secs),
            message_timeout_secs: self
                .message_timeout_secs
                .unwrap_or(defaults.message_timeout_secs),
            batch_size: self.batch_size.unwrap_or(defaults.batch_size),
            image_max_dimension: self
                .image_max_dimension
                .unwrap_or(defaults.image_max_dimension),
            jpeg_quality: self.jpeg_quality.unwrap_or(defaults.jpeg_quality),
            variant_policy: self.variant_policy.unwrap_or(defaults.variant_policy),
        };

        config.validate()?;
        Ok(config)
    }
}
