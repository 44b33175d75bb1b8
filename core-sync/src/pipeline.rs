//! # Derivative Pipeline
//!
//! Produces web-friendly derivatives and writes them to the derived store.
//!
//! ## Overview
//!
//! Two paths:
//!
//! - **Image**: download by content id, downscale to fit a bounding box
//!   (never upscale, Lanczos3), re-encode to JPEG regardless of the source
//!   format, and write under the canonical `.jpg` key. The variant policy
//!   optionally adds width-limited variants under `<stem>_w{width}.jpg`.
//! - **Video**: stream the original unmodified into the derived store under
//!   its extension-preserving key, then submit an adaptive-bitrate transcode
//!   job against that stored original. The store write completes before the
//!   job is submitted because the transcode reads from the derived store,
//!   not from the remote system.
//!
//! Transient failures propagate to the caller for retry at the dispatch
//! layer. A stage that partially writes is left as-is; reprocessing the same
//! work item is idempotent because outputs are content-addressed by key.

use bridge_traits::http::HttpClient;
use bridge_traits::remote::RemoteTree;
use bridge_traits::store::{ObjectStore, IMMUTABLE_CACHE_CONTROL};
use bridge_traits::transcode::{RenditionSpec, TranscodeJob, TranscodeService};
use bytes::Bytes;
use core_runtime::config::{MirrorConfig, VariantPolicy};
use image::codecs::jpeg::JpegEncoder;
use image::imageops::FilterType;
use image::DynamicImage;
use std::sync::Arc;
use tracing::{debug, info, instrument};

use crate::dispatch::WorkItem;
use crate::error::{Result, SyncError};
use crate::path::{derived_jpg_key, extension_of, split_key, MediaType};

/// Pipeline tuning values.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Maximum bounding box for image derivatives (pixels per side).
    pub max_dimension: u32,
    /// JPEG re-encode quality (1-100).
    pub jpeg_quality: u8,
    /// Image variant policy.
    pub variant_policy: VariantPolicy,
    /// Cache directive applied to derivative writes.
    pub cache_control: String,
}

impl PipelineConfig {
    pub fn from_config(config: &MirrorConfig) -> Self {
        Self {
            max_dimension: config.image_max_dimension,
            jpeg_quality: config.jpeg_quality,
            variant_policy: config.variant_policy.clone(),
            cache_control: IMMUTABLE_CACHE_CONTROL.to_string(),
        }
    }
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self::from_config(&MirrorConfig::default())
    }
}

/// Derivative production against the injected service seams.
pub struct DerivativePipeline {
    remote: Arc<dyn RemoteTree>,
    store: Arc<dyn ObjectStore>,
    transcoder: Arc<dyn TranscodeService>,
    http: Arc<dyn HttpClient>,
    config: PipelineConfig,
}

impl DerivativePipeline {
    pub fn new(
        remote: Arc<dyn RemoteTree>,
        store: Arc<dyn ObjectStore>,
        transcoder: Arc<dyn TranscodeService>,
        http: Arc<dyn HttpClient>,
        config: PipelineConfig,
    ) -> Self {
        Self {
            remote,
            store,
            transcoder,
            http,
            config,
        }
    }

    /// Produce the derivatives for one work item.
    #[instrument(skip(self, item), fields(key = %item.derived_key, media = %item.media_type))]
    pub async fn process(&self, item: &WorkItem) -> Result<()> {
        match item.media_type {
            MediaType::Image => self.produce_image_derivative(item).await,
            MediaType::Video => self.produce_video_derivative(item).await,
            MediaType::Ignored => Ok(()),
        }
    }

    /// Image path: download, re-encode, store.
    async fn produce_image_derivative(&self, item: &WorkItem) -> Result<()> {
        let source = self
            .remote
            .download(&item.content_id)
            .await
            .map_err(|e| SyncError::Provider(e.to_string()))?;

        debug!(bytes = source.len(), "Downloaded image source");

        let max_dimension = self.config.max_dimension;
        let quality = self.config.jpeg_quality;
        let widths = match &self.config.variant_policy {
            VariantPolicy::SingleCompressed => Vec::new(),
            VariantPolicy::MultiResolution { widths } => widths.clone(),
        };

        // Decode and re-encode on the blocking pool; this is the only
        // CPU-bound stage of the pipeline.
        let outputs = tokio::task::spawn_blocking(move || {
            render_variants(&source, max_dimension, quality, &widths)
        })
        .await
        .map_err(|e| SyncError::Internal(format!("Image task panicked: {}", e)))?
        .map_err(|e| SyncError::Decode(e.to_string()))?;

        let (dir, stem) = split_key(&item.derived_key);
        for output in outputs {
            let key = match output.width {
                None => derived_jpg_key(&item.derived_key),
                Some(w) if dir.is_empty() => format!("{}_w{}.jpg", stem, w),
                Some(w) => format!("{}/{}_w{}.jpg", dir, stem, w),
            };

            debug!(key = %key, bytes = output.data.len(), "Storing image derivative");
            self.store
                .put(
                    &key,
                    Bytes::from(output.data),
                    "image/jpeg",
                    &self.config.cache_control,
                )
                .await
                .map_err(|e| SyncError::Store(e.to_string()))?;
        }

        Ok(())
    }

    /// Video path: preserve the original, then submit the transcode job.
    async fn produce_video_derivative(&self, item: &WorkItem) -> Result<()> {
        let url = self
            .remote
            .temporary_download_url(&item.content_id)
            .await
            .map_err(|e| SyncError::Provider(e.to_string()))?;

        let original_key = item.derived_key.clone();
        let content_type = content_type_for_key(&original_key);

        let stream = self
            .http
            .download_stream(url)
            .await
            .map_err(|e| SyncError::Provider(e.to_string()))?;

        self.store
            .stream_put(&original_key, stream, content_type, &self.config.cache_control)
            .await
            .map_err(|e| SyncError::Store(e.to_string()))?;

        debug!(key = %original_key, "Stored video original");

        let (dir, stem) = split_key(&original_key);
        let output_prefix = if dir.is_empty() {
            format!("outputs/{}/", stem)
        } else {
            format!("{}/outputs/{}/", dir, stem)
        };

        let job = TranscodeJob {
            input_key: original_key,
            output_prefix,
            renditions: RenditionSpec::default(),
        };

        let job_id = self
            .transcoder
            .submit_job(job)
            .await
            .map_err(|e| SyncError::Transcode(e.to_string()))?;

        info!(job_id = %job_id, "Submitted transcode job");
        Ok(())
    }
}

struct RenderedVariant {
    /// `None` for the primary derivative, `Some(width)` for width variants.
    width: Option<u32>,
    data: Vec<u8>,
}

/// Decode a source image and render the configured JPEG variants.
fn render_variants(
    source: &[u8],
    max_dimension: u32,
    quality: u8,
    widths: &[u32],
) -> std::result::Result<Vec<RenderedVariant>, image::ImageError> {
    let img = image::load_from_memory(source)?;

    let mut outputs = Vec::with_capacity(1 + widths.len());
    outputs.push(RenderedVariant {
        width: None,
        data: encode_jpeg(&shrink_to_fit(&img, max_dimension), quality)?,
    });

    for &width in widths {
        outputs.push(RenderedVariant {
            width: Some(width),
            data: encode_jpeg(&shrink_to_fit(&img, width), quality)?,
        });
    }

    Ok(outputs)
}

/// Downscale to fit within `max` on both sides, preserving aspect ratio.
/// Images already within the box are returned unchanged; never upscales.
fn shrink_to_fit(img: &DynamicImage, max: u32) -> DynamicImage {
    if img.width() > max || img.height() > max {
        img.resize(max, max, FilterType::Lanczos3)
    } else {
        img.clone()
    }
}

fn encode_jpeg(
    img: &DynamicImage,
    quality: u8,
) -> std::result::Result<Vec<u8>, image::ImageError> {
    let mut out = Vec::new();
    let mut encoder = JpegEncoder::new_with_quality(&mut out, quality);
    // JPEG has no alpha channel; flatten to RGB before encoding.
    encoder.encode_image(&img.to_rgb8())?;
    Ok(out)
}

/// Content type of a preserved video original, by extension.
pub fn content_type_for_key(key: &str) -> &'static str {
    match extension_of(key).map(|e| e.to_ascii_lowercase()).as_deref() {
        Some("mp4") => "video/mp4",
        Some("mov") => "video/quicktime",
        Some("m4v") => "video/x-m4v",
        _ => "application/octet-stream",
    }
}
