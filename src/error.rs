//! The error taxonomy of §7: one variant per error kind, not one type per
//! collaborator. Collaborator traits (`LlmClient`, `VideoModelClient`,
//! `GenerationStore`, `ObjectStore`) all return `Result<T, CoreError>` so the
//! Orchestrator has a single place to decide retryability.

use thiserror::Error;

#[derive(Debug, Error, Clone)]
pub enum CoreError {
    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("transient network failure: {0}")]
    TransientNetwork(String),

    #[error("upstream rate limit: {0}")]
    UpstreamRateLimit(String),

    #[error("upstream unavailable after retries: {0}")]
    UpstreamUnavailable(String),

    #[error("upstream rejected content: {0}")]
    UpstreamContentRejected(String),

    #[error("agent produced malformed output: {0}")]
    AgentMalformed(String),

    #[error("agent call timed out: {0}")]
    AgentTimeout(String),

    #[error("internal I/O error: {0}")]
    InternalIO(String),

    #[error("orchestration failed: {0}")]
    OrchestrationFailed(String),

    #[error("generation cancelled")]
    Cancelled,
}

impl CoreError {
    /// Whether this error kind is recovered by the composable retry policy
    /// (§7's "Recovered locally?" column).
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            CoreError::TransientNetwork(_) | CoreError::UpstreamRateLimit(_) | CoreError::AgentTimeout(_)
        )
    }

    /// Human-readable message suitable for a terminal `error_message`
    /// (§7's "User-visible behavior" — no stack traces or retry telemetry).
    pub fn user_message(&self) -> String {
        match self {
            CoreError::InvalidInput(m) => m.clone(),
            CoreError::UpstreamUnavailable(m) => format!("upstream service unavailable: {m}"),
            CoreError::UpstreamContentRejected(m) => format!("content was rejected by the video provider: {m}"),
            CoreError::OrchestrationFailed(m) => m.clone(),
            CoreError::InternalIO(m) => format!("internal error: {m}"),
            CoreError::Cancelled => "cancelled".to_string(),
            other => other.to_string(),
        }
    }
}

impl From<std::io::Error> for CoreError {
    fn from(e: std::io::Error) -> Self {
        CoreError::InternalIO(e.to_string())
    }
}

impl From<reqwest::Error> for CoreError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            CoreError::AgentTimeout(e.to_string())
        } else if e.status().map(|s| s.as_u16() == 429).unwrap_or(false) {
            CoreError::UpstreamRateLimit(e.to_string())
        } else {
            CoreError::TransientNetwork(e.to_string())
        }
    }
}
