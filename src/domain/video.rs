//! SceneVideo: a handle to one synthesized clip (§3, §4.5).

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SceneVideo {
    pub scene_number: u32,
    pub file_path: Option<String>,
    pub cost: f64,
    pub failure_reason: Option<String>,
}

impl SceneVideo {
    pub fn succeeded(&self) -> bool {
        self.file_path.is_some()
    }
}
