//! Transcode Job Service Abstraction
//!
//! Fire-and-forget submission of adaptive-bitrate transcode jobs. The job
//! reads a stored original from the derived store and writes segmented
//! streaming renditions under an output prefix; completion is not polled by
//! the sync engine.

use async_trait::async_trait;

use crate::error::Result;

/// A single video rendition in the adaptive ladder.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VideoRendition {
    pub width: u32,
    pub height: u32,
    /// Target bitrate in bits per second.
    pub bitrate: u64,
    /// Rate-control ceiling in bits per second.
    pub max_bitrate: u64,
}

/// An audio-only rendition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AudioRendition {
    /// Target bitrate in bits per second.
    pub bitrate: u64,
    /// Sample rate in Hz.
    pub sample_rate: u32,
}

/// The full rendition specification for a transcode job.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenditionSpec {
    pub video: Vec<VideoRendition>,
    pub audio: Vec<AudioRendition>,
    /// Segment length in seconds for the packaged streaming output.
    pub segment_seconds: u32,
}

impl Default for RenditionSpec {
    /// Three video tiers plus one audio-only tier, 6-second segments.
    fn default() -> Self {
        Self {
            video: vec![
                VideoRendition {
                    width: 1920,
                    height: 1080,
                    bitrate: 5_000_000,
                    max_bitrate: 6_000_000,
                },
                VideoRendition {
                    width: 1280,
                    height: 720,
                    bitrate: 3_000_000,
                    max_bitrate: 3_600_000,
                },
                VideoRendition {
                    width: 854,
                    height: 480,
                    bitrate: 1_200_000,
                    max_bitrate: 1_500_000,
                },
            ],
            audio: vec![AudioRendition {
                bitrate: 96_000,
                sample_rate: 48_000,
            }],
            segment_seconds: 6,
        }
    }
}

/// A transcode job request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TranscodeJob {
    /// Key of the stored original in the derived store.
    pub input_key: String,
    /// Prefix under which the job writes its rendition outputs.
    pub output_prefix: String,
    pub renditions: RenditionSpec,
}

/// Transcode job submission.
#[async_trait]
pub trait TranscodeService: Send + Sync {
    /// Submit a job. Returns the service-issued job identifier. Resubmission
    /// with the same destination is idempotent from the engine's perspective.
    async fn submit_job(&self, job: TranscodeJob) -> Result<String>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_ladder_shape() {
        let spec = RenditionSpec::default();
        assert_eq!(spec.video.len(), 3);
        assert_eq!(spec.audio.len(), 1);
        assert_eq!(spec.segment_seconds, 6);
        assert_eq!(spec.video[0].height, 1080);
        assert_eq!(spec.video[2].height, 480);
    }
}
