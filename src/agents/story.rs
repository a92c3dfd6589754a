//! Story Director / Story Critic (§4.2 Phase 1, §4.7).

use super::{complete_creative, complete_structured, critic_schema, parse_critic_output, AgentContext, CriticOutput};
use crate::domain::{AgentRole, InteractionMetadata, InteractionType};
use crate::error::CoreError;
use crate::providers::llm::ChatMessage;

const STORY_DIRECTOR_SYSTEM_PROMPT: &str = "You are the Story Director for a short-form advertisement video pipeline. \
Given a brief and optional reference images, write a vivid markdown narrative of at least 1500 words \
establishing tone, setting, characters, product, and emotional arc. Do not write scene breakdowns or \
camera directions yet; that is a later stage.";

const STORY_CRITIC_SYSTEM_PROMPT: &str = "You are the Story Critic. Score the draft 0-100 on narrative \
clarity, brand fit, and emotional resonance. Reply with a single JSON object only.";

const STATUS_VALUES: [&str; 3] = ["approved", "needs_revision", "rejected"];

/// Runs one Story Director turn (§4.2 Phase 1). On `iteration == 1` the
/// brief and reference images are attached; on later iterations the
/// previous draft and critic feedback are supplied as context instead.
pub async fn run_story_director(
    ctx: &AgentContext,
    prompt: &str,
    reference_image_data_urls: &[String],
    previous: Option<(&str, &CriticOutput)>,
    iteration: u32,
) -> Result<String, CoreError> {
    let mut content = format!("Advertisement brief:\n{prompt}\n");
    let mut user_message = ChatMessage::user(String::new());

    if let Some((previous_draft, critique)) = previous {
        content.push_str(&format!(
            "\nPrevious draft (iteration {}):\n{previous_draft}\n\nCritic feedback to address:\n{}\nPriority fixes: {}\n",
            iteration - 1,
            critique.critique,
            critique.priority_fixes.join("; "),
        ));
    } else {
        user_message = user_message.with_images(reference_image_data_urls.to_vec());
    }
    user_message.content = content.clone();

    ctx.record(
        AgentRole::StoryDirector,
        InteractionType::Prompt,
        content,
        InteractionMetadata { iteration: Some(iteration), ..Default::default() },
    )
    .await;

    let draft = complete_creative(ctx, STORY_DIRECTOR_SYSTEM_PROMPT, user_message).await?;

    ctx.record(
        AgentRole::StoryDirector,
        InteractionType::Response,
        draft.clone(),
        InteractionMetadata {
            iteration: Some(iteration),
            word_count: Some(draft.split_whitespace().count()),
            ..Default::default()
        },
    )
    .await;

    Ok(draft)
}

/// Runs one Story Critic turn, scoring a draft 0-100 (§4.2 Phase 1, §4.7).
pub async fn run_story_critic(ctx: &AgentContext, draft: &str, iteration: u32) -> Result<CriticOutput, CoreError> {
    let base_user = format!("Story draft to critique:\n\n{draft}");

    ctx.record(
        AgentRole::StoryCritic,
        InteractionType::Prompt,
        base_user.clone(),
        InteractionMetadata { iteration: Some(iteration), ..Default::default() },
    )
    .await;

    let output = complete_structured(
        ctx,
        STORY_CRITIC_SYSTEM_PROMPT,
        &base_user,
        critic_schema(&STATUS_VALUES),
        parse_critic_output,
    )
    .await?;

    ctx.record(
        AgentRole::StoryCritic,
        InteractionType::Response,
        output.critique.clone(),
        InteractionMetadata {
            iteration: Some(iteration),
            score: Some(output.score),
            status: Some(output.status.clone()),
            ..Default::default()
        },
    )
    .await;

    Ok(output)
}
