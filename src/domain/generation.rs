//! Generation: the top-level unit of work (§3).

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Lifecycle state of a Generation. Terminal states (`Completed`, `Failed`)
/// are immutable once reached.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GenerationStatus {
    Processing,
    Completed,
    Failed,
}

/// An opaque binary blob supplied by the user, owned by a Generation and
/// read-only after submission.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReferenceImage {
    pub mime_type: ReferenceImageMime,
    pub bytes: Vec<u8>,
    pub original_name: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ReferenceImageMime {
    #[serde(rename = "image/jpeg")]
    Jpeg,
    #[serde(rename = "image/png")]
    Png,
}

impl ReferenceImageMime {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReferenceImageMime::Jpeg => "image/jpeg",
            ReferenceImageMime::Png => "image/png",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "image/jpeg" | "image/jpg" => Some(ReferenceImageMime::Jpeg),
            "image/png" => Some(ReferenceImageMime::Png),
            _ => None,
        }
    }
}

impl ReferenceImage {
    /// Encode to a `data:` URL for attaching to an LLM vision call.
    pub fn to_data_url(&self) -> String {
        use base64::Engine;
        let encoded = base64::engine::general_purpose::STANDARD.encode(&self.bytes);
        format!("data:{};base64,{}", self.mime_type.as_str(), encoded)
    }
}

/// A caller-provided submission, validated by the Coordinator before a
/// Generation is created (§4.1, §6.1).
#[derive(Debug, Clone)]
pub struct Submission {
    /// Identity of the authenticated caller (§4.8); governs the scratch
    /// directory layout (§6.4) but is not itself part of the data model's
    /// out-of-scope user/auth system.
    pub user_id: String,
    pub prompt: String,
    pub title: Option<String>,
    pub brand_name: Option<String>,
    pub reference_images: Vec<ReferenceImage>,
    pub client_generation_id: Option<Uuid>,
    pub max_story_iterations: u32,
    pub generate_scenes: bool,
    pub generate_videos: bool,
    pub target_duration_seconds: u32,
}

impl Default for Submission {
    fn default() -> Self {
        Self {
            user_id: String::new(),
            prompt: String::new(),
            title: None,
            brand_name: None,
            reference_images: Vec::new(),
            client_generation_id: None,
            max_story_iterations: 3,
            generate_scenes: true,
            generate_videos: true,
            target_duration_seconds: 30,
        }
    }
}

/// The persistent Generation record (§3, §6.1 Result record).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Generation {
    pub id: Uuid,
    pub user_id: String,
    pub prompt: String,
    pub title: Option<String>,
    pub brand_name: Option<String>,
    pub target_duration_seconds: u32,
    pub status: GenerationStatus,
    pub final_video_path: Option<String>,
    pub scene_video_paths: Vec<String>,
    pub num_scenes: Option<u32>,
    pub story_score: Option<u32>,
    pub cohesion_score: Option<u32>,
    pub generation_time_seconds: Option<f64>,
    pub error_message: Option<String>,
    pub llm_conversation_history: Option<serde_json::Value>,
    pub created_at: chrono::DateTime<chrono::Utc>,
    pub updated_at: chrono::DateTime<chrono::Utc>,
}

impl Generation {
    pub fn new(id: Uuid, submission: &Submission) -> Self {
        let now = chrono::Utc::now();
        Self {
            id,
            user_id: submission.user_id.clone(),
            prompt: submission.prompt.clone(),
            title: submission.title.clone(),
            brand_name: submission.brand_name.clone(),
            target_duration_seconds: submission.target_duration_seconds,
            status: GenerationStatus::Processing,
            final_video_path: None,
            scene_video_paths: Vec::new(),
            num_scenes: None,
            story_score: None,
            cohesion_score: None,
            generation_time_seconds: None,
            error_message: None,
            llm_conversation_history: None,
            created_at: now,
            updated_at: now,
        }
    }
}
