//! Video Model Client (§2, §4.5): single-call reference-to-video
//! synthesis. Grounded on the teacher's `FalClient` (`providers::fal`) —
//! same shape (model-name-to-endpoint dispatch, API-key header, JSON
//! body) — generalized from Fal's Kling/Flux endpoints to a
//! provider-agnostic request/response pair since the concrete video SDK is
//! out of scope (§1).

use crate::domain::VideoPromptParameters;
use crate::error::CoreError;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize)]
pub struct VideoSynthesisRequest {
    pub prompt: String,
    pub negative_prompt: String,
    pub duration_seconds: u32,
    pub aspect_ratio: String,
    pub resolution: String,
    pub generate_audio: bool,
    pub reference_image_data_urls: Vec<String>,
}

impl From<(&VideoPromptParameters, Vec<String>)> for VideoSynthesisRequest {
    fn from((params, reference_image_data_urls): (&VideoPromptParameters, Vec<String>)) -> Self {
        Self {
            prompt: params.prompt.clone(),
            negative_prompt: params.negative_prompt.clone(),
            duration_seconds: params.duration_seconds,
            aspect_ratio: params.aspect_ratio.clone(),
            resolution: params.resolution.clone(),
            generate_audio: params.generate_audio,
            reference_image_data_urls,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct VideoSynthesisResult {
    pub media: Vec<u8>,
    pub cost: f64,
}

/// The R2V synthesis collaborator (§1 GLOSSARY). The concrete provider SDK
/// is out of scope; the Parallel Video Synthesizer depends on this trait so
/// the bounded-concurrency/retry/partial-failure logic is exercised against
/// a fake in tests (§8).
#[async_trait]
pub trait VideoModelClient: Send + Sync {
    async fn synthesize(&self, request: VideoSynthesisRequest) -> Result<VideoSynthesisResult, CoreError>;
}

/// Default HTTP implementation, shaped like the teacher's `FalClient`.
#[derive(Clone)]
pub struct HttpVideoModelClient {
    api_key: String,
    endpoint: String,
    http_client: reqwest::Client,
}

impl HttpVideoModelClient {
    /// `timeout` is the deadline for a single video synthesis call (§5,
    /// default 600s), applied to both the synthesis request and the
    /// subsequent media download — either stalling forever without it.
    pub fn new(api_key: impl Into<String>, endpoint: impl Into<String>, timeout: std::time::Duration) -> Self {
        Self {
            api_key: api_key.into(),
            endpoint: endpoint.into(),
            http_client: reqwest::Client::builder()
                .timeout(timeout)
                .build()
                .unwrap_or_else(|_| reqwest::Client::new()),
        }
    }
}

#[async_trait]
impl VideoModelClient for HttpVideoModelClient {
    async fn synthesize(&self, request: VideoSynthesisRequest) -> Result<VideoSynthesisResult, CoreError> {
        let response = self
            .http_client
            .post(&self.endpoint)
            .header("Authorization", format!("Key {}", self.api_key))
            .json(&request)
            .send()
            .await?;

        if response.status() == reqwest::StatusCode::UNPROCESSABLE_ENTITY {
            let reason = response.text().await.unwrap_or_default();
            return Err(CoreError::UpstreamContentRejected(reason));
        }

        let body: serde_json::Value = response.json().await?;
        let media_url = body
            .get("output")
            .and_then(|o| o.get("video"))
            .and_then(|v| v.get("url"))
            .and_then(|u| u.as_str())
            .ok_or_else(|| CoreError::TransientNetwork("missing video url in response".into()))?;
        let cost = body.get("cost").and_then(|c| c.as_f64()).unwrap_or(0.0);

        let media = self.http_client.get(media_url).send().await?.bytes().await?.to_vec();
        Ok(VideoSynthesisResult { media, cost })
    }
}
