//! Story: the Phase 1 hand-off (§3, §4.2 Phase 1).

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StoryStatus {
    Approved,
    NeedsRevision,
    Rejected,
}

/// A scored story draft. `score` is 0-100, enforced by the Story Critic.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Story {
    pub content: String,
    pub score: u32,
    pub status: StoryStatus,
    pub iteration: u32,
}

impl Story {
    /// Soft floor from §3: stories are expected to be >= 7500 characters.
    pub const MIN_CHARS: usize = 7500;

    pub fn meets_length_floor(&self) -> bool {
        self.content.len() >= Self::MIN_CHARS
    }
}
