//! Scene Writer / Scene Critic (§4.2 Phase 2 Step A, §4.7).

use super::{complete_creative, complete_structured, critic_schema, parse_critic_output, AgentContext, CriticOutput};
use crate::domain::{AgentRole, InteractionMetadata, InteractionType};
use crate::error::CoreError;
use crate::providers::llm::ChatMessage;

const SCENE_WRITER_SYSTEM_PROMPT: &str = "You are the Scene Writer. Given the full story and the scenes already \
approved in this generation, write scene N as a 150-250 word cinematography-structured markdown block: shot \
description, camera movement, lighting, and on-screen action. Stay consistent with previously approved scenes.";

const SCENE_CRITIC_SYSTEM_PROMPT: &str = "You are the Scene Critic. Score the scene 0-100 on visual clarity, \
pacing, and consistency with prior scenes. Reply with a single JSON object only.";

const STATUS_VALUES: [&str; 3] = ["approved", "needs_minor_revision", "needs_revision"];

const SCENE_COUNT_SYSTEM_PROMPT: &str = "You are the Scene Writer. Decide how many scenes (3-8 inclusive) this \
story naturally breaks into for a short advertisement, given a suggested target. Reply with a single JSON \
object only.";

/// Asks the Scene Writer how many scenes the story naturally produces
/// (§4.2 Phase 2 Step A), informed by a suggested target derived from the
/// requested duration. The LLM's answer is clamped to the 3-8 range.
pub async fn run_scene_count(ctx: &AgentContext, story: &str, suggested_target: u32) -> Result<u32, CoreError> {
    let base_user = format!(
        "Story:\n{story}\n\nSuggested target scene count: {suggested_target} (each scene is 4, 6, or 8 seconds). \
How many scenes (3-8) should this story be broken into?"
    );
    let schema = serde_json::json!({
        "type": "object",
        "properties": { "scene_count": { "type": "integer", "minimum": 3, "maximum": 8 } },
        "required": ["scene_count"],
    });

    #[derive(serde::Deserialize)]
    struct SceneCountWire {
        scene_count: u32,
    }

    let parsed = super::complete_structured(ctx, SCENE_COUNT_SYSTEM_PROMPT, &base_user, schema, |raw| {
        let json_str = super::extract_json_object(raw)?;
        let wire: SceneCountWire =
            serde_json::from_str(json_str).map_err(|e| CoreError::AgentMalformed(format!("scene count parse error: {e}")))?;
        Ok(wire.scene_count)
    })
    .await?;

    Ok(parsed.clamp(3, 8))
}

/// Runs one Scene Writer turn for `scene_number` (§4.2 Phase 2 Step A). The
/// writer is given the full story, prior critic feedback (if any), and the
/// content of every previously approved scene in this generation.
pub async fn run_scene_writer(
    ctx: &AgentContext,
    story: &str,
    scene_number: u32,
    approved_scenes_so_far: &[String],
    previous: Option<(&str, &CriticOutput)>,
    iteration: u32,
) -> Result<String, CoreError> {
    let mut content = format!("Full story:\n{story}\n\nWrite scene {scene_number}.\n");
    if !approved_scenes_so_far.is_empty() {
        content.push_str("\nScenes already approved in this generation:\n");
        for (index, scene) in approved_scenes_so_far.iter().enumerate() {
            content.push_str(&format!("\nScene {}:\n{scene}\n", index + 1));
        }
    }
    if let Some((previous_draft, critique)) = previous {
        content.push_str(&format!(
            "\nPrevious draft of this scene (iteration {}):\n{previous_draft}\n\nCritic feedback to address:\n{}\n",
            iteration - 1,
            critique.critique,
        ));
    }

    ctx.record(
        AgentRole::SceneWriter,
        InteractionType::Prompt,
        content.clone(),
        InteractionMetadata { iteration: Some(iteration), scene_number: Some(scene_number), ..Default::default() },
    )
    .await;

    let draft = complete_creative(ctx, SCENE_WRITER_SYSTEM_PROMPT, ChatMessage::user(content)).await?;

    ctx.record(
        AgentRole::SceneWriter,
        InteractionType::Response,
        draft.clone(),
        InteractionMetadata {
            iteration: Some(iteration),
            scene_number: Some(scene_number),
            word_count: Some(draft.split_whitespace().count()),
            ..Default::default()
        },
    )
    .await;

    Ok(draft)
}

/// Runs one Scene Critic turn for `scene_number` (§4.2 Phase 2 Step A).
pub async fn run_scene_critic(
    ctx: &AgentContext,
    scene_content: &str,
    scene_number: u32,
    iteration: u32,
) -> Result<CriticOutput, CoreError> {
    let base_user = format!("Scene {scene_number} to critique:\n\n{scene_content}");

    ctx.record(
        AgentRole::SceneCritic,
        InteractionType::Prompt,
        base_user.clone(),
        InteractionMetadata { iteration: Some(iteration), scene_number: Some(scene_number), ..Default::default() },
    )
    .await;

    let output = complete_structured(
        ctx,
        SCENE_CRITIC_SYSTEM_PROMPT,
        &base_user,
        critic_schema(&STATUS_VALUES),
        parse_critic_output,
    )
    .await?;

    ctx.record(
        AgentRole::SceneCritic,
        InteractionType::Response,
        output.critique.clone(),
        InteractionMetadata {
            iteration: Some(iteration),
            scene_number: Some(scene_number),
            score: Some(output.score),
            status: Some(output.status.clone()),
            ..Default::default()
        },
    )
    .await;

    Ok(output)
}
