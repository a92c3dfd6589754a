//! AgentInteraction: the append-only record of one agent's emitted content
//! (§3, §4.7).

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InteractionType {
    Prompt,
    Response,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AgentRole {
    StoryDirector,
    StoryCritic,
    SceneWriter,
    SceneCritic,
    SceneCohesor,
    SceneEnhancer,
    SceneAligner,
    AppearanceSanitizer,
    VideoStitcher,
}

impl AgentRole {
    pub fn name(&self) -> &'static str {
        match self {
            AgentRole::StoryDirector => "story_director",
            AgentRole::StoryCritic => "story_critic",
            AgentRole::SceneWriter => "scene_writer",
            AgentRole::SceneCritic => "scene_critic",
            AgentRole::SceneCohesor => "scene_cohesor",
            AgentRole::SceneEnhancer => "scene_enhancer",
            AgentRole::SceneAligner => "scene_aligner",
            AgentRole::AppearanceSanitizer => "appearance_sanitizer",
            AgentRole::VideoStitcher => "video_stitcher",
        }
    }
}

/// Typed metadata bag attached to an interaction (§3).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct InteractionMetadata {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub iteration: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scene_number: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub score: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub word_count: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expansion_percent: Option<f64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentInteraction {
    pub agent_name: String,
    pub interaction_type: InteractionType,
    pub content: String,
    pub metadata: InteractionMetadata,
    pub timestamp: chrono::DateTime<chrono::Utc>,
}

impl AgentInteraction {
    pub fn new(
        role: AgentRole,
        interaction_type: InteractionType,
        content: impl Into<String>,
        metadata: InteractionMetadata,
    ) -> Self {
        Self {
            agent_name: role.name().to_string(),
            interaction_type,
            content: content.into(),
            metadata,
            timestamp: chrono::Utc::now(),
        }
    }
}
