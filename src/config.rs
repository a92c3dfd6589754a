//! Configuration module for the ad generation core.

use serde::Deserialize;
use std::time::Duration;

/// Application configuration loaded from environment variables.
#[derive(Clone, Debug, Deserialize)]
pub struct Config {
    /// LLM provider API key.
    pub llm_api_key: String,

    /// LLM model identifier used for agent calls.
    pub llm_model: String,

    /// LLM provider completion endpoint.
    pub llm_endpoint: String,

    /// Video synthesis provider API key.
    pub video_api_key: String,

    /// Video synthesis provider endpoint.
    pub video_endpoint: String,

    /// Auth public key, if an `AuthLayer` is wired in front of submission.
    pub auth_public_key: String,

    /// Base directory for per-generation scratch areas (§6.4).
    pub scratch_base_dir: String,

    /// Environment (development, staging, production).
    pub environment: Environment,

    /// Orchestration knobs (§4.2, §4.3, §4.5, §4.6, §5).
    pub orchestration: OrchestrationConfig,
}

#[derive(Clone, Debug, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    #[default]
    Development,
    Staging,
    Production,
}

/// The "configuration knobs" the data model (§3) references but the
/// distilled spec never enumerates in one place.
#[derive(Clone, Debug, Deserialize)]
pub struct OrchestrationConfig {
    /// Phase 1 iteration cap (§4.2).
    pub max_story_iterations: u32,
    /// Story Critic early-termination threshold (§4.2, Property 4).
    pub story_approval_score: u32,
    /// Phase 2 per-scene iteration cap (§4.2 Step A).
    pub max_scene_iterations: u32,
    /// Scene Critic early-termination threshold (§4.2 Step A, Property 4).
    pub scene_approval_score: u32,
    /// Phase 2 cohesion-pass iteration cap (§4.2 Step B).
    pub max_cohesion_iterations: u32,
    /// Scene Cohesor early-termination threshold (§4.2 Step B, Property 4).
    pub cohesion_approval_score: u32,
    /// Maximum reference images per generation (§4.1, §6.1).
    pub max_reference_images: usize,
    /// Per-image size cap in bytes (§4.1, default 10 MB).
    pub max_image_bytes: usize,
    /// K: max concurrent video-model calls (§4.5, default 4).
    pub max_synthesis_concurrency: usize,
    /// Max concurrent per-scene enhancement LLM calls (§4.2 Phase 3, §9 Open
    /// Question 5).
    pub max_enhancement_concurrency: usize,
    /// Per-subscriber Progress Bus buffer depth (§4.3, default 256).
    pub subscriber_buffer_depth: usize,
    /// Deadline for a single LLM call (§5, default 120s).
    pub llm_timeout: Duration,
    /// Deadline for a single video synthesis call (§5, default 600s).
    pub video_timeout: Duration,
    /// Stitcher: target frame rate (§4.6, default 24fps).
    pub stitch_fps: u32,
    /// Stitcher: intro/outro fade duration in seconds (§4.6, default 0.3s).
    pub stitch_edge_fade_seconds: f64,
    /// Stitcher: output video bitrate in kbps (§4.6, default 5000).
    pub stitch_bitrate_kbps: u32,
}

impl Default for OrchestrationConfig {
    fn default() -> Self {
        Self {
            max_story_iterations: 3,
            story_approval_score: 85,
            max_scene_iterations: 3,
            scene_approval_score: 80,
            max_cohesion_iterations: 2,
            cohesion_approval_score: 75,
            max_reference_images: 3,
            max_image_bytes: 10 * 1024 * 1024,
            max_synthesis_concurrency: 4,
            max_enhancement_concurrency: 4,
            subscriber_buffer_depth: 256,
            llm_timeout: Duration::from_secs(120),
            video_timeout: Duration::from_secs(600),
            stitch_fps: 24,
            stitch_edge_fade_seconds: 0.3,
            stitch_bitrate_kbps: 5000,
        }
    }
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> anyhow::Result<Self> {
        // Load .env file in development
        let _ = dotenvy::dotenv();

        let mut orchestration = OrchestrationConfig::default();
        if let Ok(v) = std::env::var("MAX_STORY_ITERATIONS") {
            orchestration.max_story_iterations = v.parse()?;
        }
        if let Ok(v) = std::env::var("MAX_SYNTHESIS_CONCURRENCY") {
            orchestration.max_synthesis_concurrency = v.parse()?;
        }
        if let Ok(v) = std::env::var("SUBSCRIBER_BUFFER_DEPTH") {
            orchestration.subscriber_buffer_depth = v.parse()?;
        }

        Ok(Self {
            llm_api_key: std::env::var("LLM_API_KEY").unwrap_or_default(),
            llm_model: std::env::var("LLM_MODEL").unwrap_or_else(|_| "gpt-4o".to_string()),
            llm_endpoint: std::env::var("LLM_ENDPOINT").unwrap_or_else(|_| "https://api.openai.com/v1/chat/completions".to_string()),
            video_api_key: std::env::var("VIDEO_API_KEY").unwrap_or_default(),
            video_endpoint: std::env::var("VIDEO_ENDPOINT").unwrap_or_else(|_| "https://api.fal.ai/v1/video".to_string()),
            auth_public_key: std::env::var("AUTH_PUBLIC_KEY").unwrap_or_default(),
            scratch_base_dir: std::env::var("SCRATCH_BASE_DIR")
                .unwrap_or_else(|_| "/tmp/admint-scratch".to_string()),
            environment: match std::env::var("ENVIRONMENT").as_deref() {
                Ok("production") => Environment::Production,
                Ok("staging") => Environment::Staging,
                _ => Environment::Development,
            },
            orchestration,
        })
    }

    /// Check if running in production
    pub fn is_production(&self) -> bool {
        matches!(self.environment, Environment::Production)
    }
}
