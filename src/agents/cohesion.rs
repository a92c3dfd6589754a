//! Scene Cohesor (§4.2 Phase 2 Step B, §4.7 point 4).

use super::{complete_structured, AgentContext};
use crate::domain::{AgentRole, CohesionReport, InteractionMetadata, InteractionType, PairwiseTransition};
use crate::error::CoreError;
use serde::Deserialize;

const SCENE_COHESOR_SYSTEM_PROMPT: &str = "You are the Scene Cohesor. Given the full ordered set of approved \
scenes, score overall cross-scene cohesion 0-100 and score each adjacent pair's transition quality 0-100. Flag \
scenes that need another writer pass in scene_specific. Reply with a single JSON object only.";

fn cohesion_schema() -> serde_json::Value {
    serde_json::json!({
        "type": "object",
        "properties": {
            "overall_cohesion_score": { "type": "integer", "minimum": 0, "maximum": 100 },
            "pairwise": {
                "type": "array",
                "items": {
                    "type": "object",
                    "properties": {
                        "from_scene": { "type": "integer" },
                        "to_scene": { "type": "integer" },
                        "transition_score": { "type": "integer", "minimum": 0, "maximum": 100 },
                        "critique": { "type": "string" },
                    },
                    "required": ["from_scene", "to_scene", "transition_score", "critique"],
                },
            },
            "global_issues": { "type": "array", "items": { "type": "string" } },
            "scene_specific": {
                "type": "array",
                "items": {
                    "type": "object",
                    "properties": {
                        "scene_number": { "type": "integer" },
                        "feedback": { "type": "string" },
                    },
                    "required": ["scene_number", "feedback"],
                },
            },
        },
        "required": ["overall_cohesion_score", "pairwise"],
    })
}

#[derive(Debug, Deserialize)]
struct PairwiseWire {
    from_scene: u32,
    to_scene: u32,
    transition_score: u32,
    critique: String,
}

#[derive(Debug, Deserialize)]
struct SceneFeedbackWire {
    scene_number: u32,
    feedback: String,
}

#[derive(Debug, Deserialize)]
struct CohesionWire {
    overall_cohesion_score: u32,
    pairwise: Vec<PairwiseWire>,
    #[serde(default)]
    global_issues: Vec<String>,
    #[serde(default)]
    scene_specific: Vec<SceneFeedbackWire>,
}

fn parse_cohesion_output(raw: &str) -> Result<CohesionReport, CoreError> {
    let json_str = super::extract_json_object(raw)?;
    let wire: CohesionWire = serde_json::from_str(json_str)
        .map_err(|e| CoreError::AgentMalformed(format!("cohesion output parse error: {e}")))?;

    let pairwise = wire
        .pairwise
        .into_iter()
        .map(|p| PairwiseTransition {
            from_scene: p.from_scene,
            to_scene: p.to_scene,
            transition_score: p.transition_score,
            critique: p.critique,
        })
        .collect();
    let scene_specific_feedback = wire.scene_specific.into_iter().map(|f| (f.scene_number, f.feedback)).collect();

    Ok(CohesionReport {
        overall_cohesion_score: wire.overall_cohesion_score,
        pairwise,
        global_issues: wire.global_issues,
        scene_specific_feedback,
    })
}

/// Runs one Scene Cohesor turn over the full approved-scene array (§4.2
/// Phase 2 Step B).
pub async fn run_scene_cohesor(ctx: &AgentContext, scenes: &[String], iteration: u32) -> Result<CohesionReport, CoreError> {
    let mut base_user = String::from("Approved scenes, in order:\n");
    for (index, scene) in scenes.iter().enumerate() {
        base_user.push_str(&format!("\nScene {}:\n{scene}\n", index + 1));
    }

    ctx.record(
        AgentRole::SceneCohesor,
        InteractionType::Prompt,
        base_user.clone(),
        InteractionMetadata { iteration: Some(iteration), ..Default::default() },
    )
    .await;

    let report = complete_structured(ctx, SCENE_COHESOR_SYSTEM_PROMPT, &base_user, cohesion_schema(), parse_cohesion_output).await?;

    ctx.record(
        AgentRole::SceneCohesor,
        InteractionType::Response,
        format!("overall_cohesion_score={}", report.overall_cohesion_score),
        InteractionMetadata { iteration: Some(iteration), score: Some(report.overall_cohesion_score), ..Default::default() },
    )
    .await;

    Ok(report)
}
