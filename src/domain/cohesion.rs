//! CohesionReport and the transition-score -> TransitionKind mapping (§3).

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// A transition judgment between one adjacent scene pair `(i, i+1)`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PairwiseTransition {
    pub from_scene: u32,
    pub to_scene: u32,
    pub transition_score: u32,
    pub critique: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CohesionReport {
    pub overall_cohesion_score: u32,
    pub pairwise: Vec<PairwiseTransition>,
    pub global_issues: Vec<String>,
    pub scene_specific_feedback: HashMap<u32, String>,
}

/// The three canonical transition kinds (§3, GLOSSARY).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransitionKind {
    Cut,
    Crossfade,
    Fade,
}

impl TransitionKind {
    /// Total, deterministic mapping from a pairwise transition score to a
    /// TransitionKind. Ties go to the upper bucket (§3).
    pub fn from_score(score: u32) -> Self {
        if score >= 85 {
            TransitionKind::Crossfade
        } else if score >= 70 {
            TransitionKind::Cut
        } else {
            TransitionKind::Fade
        }
    }

    /// Transition duration in seconds, per the fixed table in §3/§4.6.
    pub fn duration_seconds(&self) -> f64 {
        match self {
            TransitionKind::Crossfade => 0.5,
            TransitionKind::Cut => 0.0,
            TransitionKind::Fade => 0.8,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transition_mapping_is_total_and_deterministic() {
        assert_eq!(TransitionKind::from_score(100), TransitionKind::Crossfade);
        assert_eq!(TransitionKind::from_score(85), TransitionKind::Crossfade);
        assert_eq!(TransitionKind::from_score(84), TransitionKind::Cut);
        assert_eq!(TransitionKind::from_score(70), TransitionKind::Cut);
        assert_eq!(TransitionKind::from_score(69), TransitionKind::Fade);
        assert_eq!(TransitionKind::from_score(0), TransitionKind::Fade);
    }
}
