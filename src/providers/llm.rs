//! LLM Client (§2, §4.7): text and vision completion requests against an
//! external chat model. Grounded on the teacher's `VertexClient`
//! (`providers::vertex`) — same shape (project/region-style config, a
//! `reqwest::Client`, one call per request), generalized from Gemini's
//! `streamGenerateContent` wire format to a provider-agnostic
//! request/response pair since the concrete LLM SDK is out of scope (§1).

use crate::error::CoreError;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// One turn in a chat-style completion request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
    /// Vision parts attached to this message, encoded as data URLs
    /// (§3 ReferenceImage, §4.7 point 2).
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub image_data_urls: Vec<String>,
}

impl ChatMessage {
    pub fn user(content: impl Into<String>) -> Self {
        Self { role: "user".to_string(), content: content.into(), image_data_urls: Vec::new() }
    }

    pub fn system(content: impl Into<String>) -> Self {
        Self { role: "system".to_string(), content: content.into(), image_data_urls: Vec::new() }
    }

    pub fn with_images(mut self, images: Vec<String>) -> Self {
        self.image_data_urls = images;
        self
    }
}

/// Sampling parameters, one set per agent role (§4.7 point 3): creative
/// roles use temperature 0.9; critic roles use temperature 0.3 with a
/// schema-constrained response.
#[derive(Debug, Clone, Serialize)]
pub struct SamplingParams {
    pub temperature: f32,
    pub max_tokens: u32,
    /// When set, the provider is asked to constrain output to this JSON
    /// schema (critic/cohesor roles).
    pub json_schema: Option<serde_json::Value>,
}

impl SamplingParams {
    pub fn creative() -> Self {
        Self { temperature: 0.9, max_tokens: 4096, json_schema: None }
    }

    pub fn critic(schema: serde_json::Value) -> Self {
        Self { temperature: 0.3, max_tokens: 2048, json_schema: Some(schema) }
    }
}

#[derive(Debug, Clone)]
pub struct ChatRequest {
    pub model: String,
    pub messages: Vec<ChatMessage>,
    pub sampling: SamplingParams,
}

/// An LLM completion collaborator. The concrete provider SDK is out of
/// scope (§1); agents depend on this trait so they can be exercised with a
/// fake in tests (§8).
#[async_trait]
pub trait LlmClient: Send + Sync {
    async fn complete(&self, request: ChatRequest) -> Result<String, CoreError>;
}

/// Default HTTP implementation, shaped like the teacher's `VertexClient`:
/// a bare `reqwest::Client` posting a JSON body to a single completion
/// endpoint and reading back a text field.
#[derive(Clone)]
pub struct HttpLlmClient {
    api_key: String,
    endpoint: String,
    http_client: reqwest::Client,
}

impl HttpLlmClient {
    /// `timeout` is the deadline for a single LLM call (§5, default 120s).
    /// A stalled connection with no response is mapped to
    /// `CoreError::AgentTimeout` by `reqwest::Error`'s `From` impl once the
    /// client's own timeout fires, rather than hanging the calling task
    /// forever.
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
impl LlmClient for HttpLlmClient {
    async fn complete(&self, request: ChatRequest) -> Result<String, CoreError> {
        let contents: Vec<serde_json::Value> = request
            .messages
            .iter()
            .map(|m| {
                let mut parts = vec![serde_json::json!({ "text": m.content })];
                for url in &m.image_data_urls {
                    parts.push(serde_json::json!({ "image_url": url }));
                }
                serde_json::json!({ "role": m.role, "parts": parts })
            })
            .collect();

        let body = serde_json::json!({
            "model": request.model,
            "messages": contents,
            "temperature": request.sampling.temperature,
            "max_tokens": request.sampling.max_tokens,
            "response_schema": request.sampling.json_schema,
        });

        let response = self
            .http_client
            .post(&self.endpoint)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .json(&body)
            .send()
            .await?;

        let result: serde_json::Value = response.json().await?;
        result
            .get("content")
            .and_then(|c| c.as_str())
            .map(|s| s.to_string())
            .ok_or_else(|| CoreError::AgentMalformed("missing content field in LLM response".into()))
    }
}
