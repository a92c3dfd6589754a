//! Scene and the Phase 3 VideoPromptParameters hand-off (§3, §4.2, §4.5).

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SceneStatus {
    Approved,
    NeedsMinorRevision,
    NeedsRevision,
}

/// One member of the ordered 3-8 scene sequence derived from a Story.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Scene {
    pub scene_number: u32,
    pub duration_seconds: u32,
    pub content: String,
    pub enhanced_content: Option<String>,
    pub score: u32,
    pub status: SceneStatus,
}

impl Scene {
    /// Allowed per-scene clip durations (§3).
    pub const ALLOWED_DURATIONS: [u32; 3] = [4, 6, 8];

    pub fn new(scene_number: u32, duration_seconds: u32, content: String) -> Self {
        Self {
            scene_number,
            duration_seconds,
            content,
            enhanced_content: None,
            score: 0,
            status: SceneStatus::NeedsRevision,
        }
    }

    /// Percent expansion of `enhanced_content` over `content`, as logged by
    /// the Scene Enhancer (§4.2 Phase 3, item 1).
    pub fn expansion_percent(&self) -> Option<f64> {
        self.enhanced_content.as_ref().map(|enhanced| {
            let before = self.content.len().max(1) as f64;
            let after = enhanced.len() as f64;
            ((after - before) / before) * 100.0
        })
    }
}

/// Final per-scene synthesis input produced at the end of Phase 3.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VideoPromptParameters {
    pub scene_number: u32,
    pub prompt: String,
    pub negative_prompt: String,
    pub duration_seconds: u32,
    pub aspect_ratio: String,
    pub resolution: String,
    pub generate_audio: bool,
    pub reference_image_handles: Vec<String>,
}

impl VideoPromptParameters {
    pub const NEGATIVE_PROMPT: &'static str = "blurry, distorted, low quality, watermark, text overlay, extra limbs, warped geometry, flickering, artifacts, oversaturated, inconsistent lighting";
    pub const ASPECT_RATIO: &'static str = "16:9";
    pub const RESOLUTION: &'static str = "1080p";
}
