//! Transcode Job Submission over HTTP
//!
//! Posts transcode jobs to a configured job-service endpoint. Submission is
//! fire-and-forget; job completion is never polled.

use async_trait::async_trait;
use bridge_traits::{
    error::{BridgeError, Result},
    http::{HttpClient, HttpMethod, HttpRequest},
    transcode::{TranscodeJob, TranscodeService},
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

#[derive(Debug, Serialize)]
struct SubmitJobRequest<'a> {
    input: &'a str,
    #[serde(rename = "outputPrefix")]
    output_prefix: &'a str,
    #[serde(rename = "segmentSeconds")]
    segment_seconds: u32,
    video: Vec<VideoRenditionBody>,
    audio: Vec<AudioRenditionBody>,
}

#[derive(Debug, Serialize)]
struct VideoRenditionBody {
    width: u32,
    height: u32,
    bitrate: u64,
    #[serde(rename = "maxBitrate")]
    max_bitrate: u64,
}

#[derive(Debug, Serialize)]
struct AudioRenditionBody {
    bitrate: u64,
    #[serde(rename = "sampleRate")]
    sample_rate: u32,
}

#[derive(Debug, Deserialize)]
struct SubmitJobResponse {
    #[serde(rename = "jobId")]
    job_id: String,
}

/// HTTP client for a transcode job service.
pub struct HttpTranscodeClient {
    http: Arc<dyn HttpClient>,
    endpoint: String,
}

impl HttpTranscodeClient {
    pub fn new(http: Arc<dyn HttpClient>, endpoint: impl Into<String>) -> Self {
        Self {
            http,
            endpoint: endpoint.into(),
        }
    }
}

#[async_trait]
impl TranscodeService for HttpTranscodeClient {
    async fn submit_job(&self, job: TranscodeJob) -> Result<String> {
        let body = SubmitJobRequest {
            input: &job.input_key,
            output_prefix: &job.output_prefix,
            segment_seconds: job.renditions.segment_seconds,
            video: job
                .renditions
                .video
                .iter()
                .map(|v| VideoRenditionBody {
                    width: v.width,
                    height: v.height,
                    bitrate: v.bitrate,
                    max_bitrate: v.max_bitrate,
                })
                .collect(),
            audio: job
                .renditions
                .audio
                .iter()
                .map(|a| AudioRenditionBody {
                    bitrate: a.bitrate,
                    sample_rate: a.sample_rate,
                })
                .collect(),
        };

        let request = HttpRequest::new(HttpMethod::Post, self.endpoint.clone())
            .timeout(Duration::from_secs(30))
            .json(&body)?;

        let response = self.http.execute(request).await?;
        if !response.is_success() {
            return Err(BridgeError::OperationFailed(format!(
                "Transcode submission failed with status {}",
                response.status
            )));
        }

        let parsed: SubmitJobResponse = response.json()?;
        info!(job_id = %parsed.job_id, input = %job.input_key, "Submitted transcode job");
        Ok(parsed.job_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bridge_traits::http::HttpResponse;
    use bridge_traits::transcode::RenditionSpec;
    use bytes::Bytes;
    use std::collections::HashMap;
    use std::sync::Mutex;

    struct CapturingHttp {
        last_body: Mutex<Option<Vec<u8>>>,
    }

    #[async_trait]
    impl HttpClient for CapturingHttp {
        async fn execute(&self, request: HttpRequest) -> Result<HttpResponse> {
            *self.last_body.lock().unwrap() = request.body.map(|b| b.to_vec());
            Ok(HttpResponse {
                status: 200,
                headers: HashMap::new(),
                body: Bytes::from_static(br#"{"jobId": "job-7"}"#),
            })
        }

        async fn download_stream(
            &self,
            _url: String,
        ) -> Result<Box<dyn tokio::io::AsyncRead + Send + Unpin>> {
            Err(BridgeError::NotAvailable("download_stream".to_string()))
        }
    }

    #[tokio::test]
    async fn test_submit_posts_job_and_returns_id() {
        let http = Arc::new(CapturingHttp {
            last_body: Mutex::new(None),
        });
        let client = HttpTranscodeClient::new(http.clone(), "https://transcode.example/jobs");

        let job = TranscodeJob {
            input_key: "0 US/smith/a/clip.MOV".to_string(),
            output_prefix: "0 US/smith/a/outputs/clip/".to_string(),
            renditions: RenditionSpec::default(),
        };

        let job_id = client.submit_job(job).await.unwrap();
        assert_eq!(job_id, "job-7");

        let body = http.last_body.lock().unwrap().clone().unwrap();
        let sent: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(sent["input"], "0 US/smith/a/clip.MOV");
        assert_eq!(sent["outputPrefix"], "0 US/smith/a/outputs/clip/");
        assert_eq!(sent["video"].as_array().unwrap().len(), 3);
        assert_eq!(sent["audio"].as_array().unwrap().len(), 1);
    }
}
