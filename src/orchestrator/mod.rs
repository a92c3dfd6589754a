//! Agent Orchestrator (§4.2): sequences the nine agent roles across three
//! phases, enforcing scoring thresholds, iteration caps, and hand-offs.
//! Phase 4 (synthesis + stitching) is delegated to `synthesizer`/`stitcher`
//! and driven by the Coordinator, not this module (§4.2 Phase 4).

use crate::agents::{
    run_appearance_sanitizer, run_scene_aligner, run_scene_cohesor, run_scene_count, run_scene_critic,
    run_scene_enhancer, run_scene_writer, run_story_critic, run_story_director, AgentContext, CriticOutput,
};
use crate::config::OrchestrationConfig;
use crate::domain::{
    CohesionReport, Scene, SceneStatus, Story, StoryStatus, VideoPromptParameters,
};
use crate::error::CoreError;

/// Result of Phase 1 (§4.2 Phase 1).
pub struct StoryPhaseOutput {
    pub story: Story,
}

/// Result of Phase 2 (§4.2 Phase 2).
pub struct ScenePhaseOutput {
    pub scenes: Vec<Scene>,
    pub cohesion: CohesionReport,
}

/// Runs Phase 1 — the Story Director / Story Critic loop with early
/// termination at `story_approval_score` and a "highest score, latest
/// iteration on tie" floor on cap exhaustion (§4.2 Phase 1, §9 Open
/// Question 1).
pub async fn run_story_phase(
    ctx: &AgentContext,
    prompt: &str,
    reference_image_data_urls: &[String],
    config: &OrchestrationConfig,
) -> Result<StoryPhaseOutput, CoreError> {
    let mut best: Option<(String, CriticOutput, u32)> = None;
    let mut previous: Option<(String, CriticOutput)> = None;

    for iteration in 1..=config.max_story_iterations {
        let previous_ref = previous.as_ref().map(|(draft, critique)| (draft.as_str(), critique));
        let draft = run_story_director(ctx, prompt, reference_image_data_urls, previous_ref, iteration).await?;
        let critique = run_story_critic(ctx, &draft, iteration).await?;

        tracing::info!(generation_id = %ctx.generation_id, iteration, score = critique.score, "story iteration scored");

        let is_better_or_tied = best
            .as_ref()
            .map(|(_, best_critique, _)| critique.score >= best_critique.score)
            .unwrap_or(true);
        if is_better_or_tied {
            best = Some((draft.clone(), critique.clone(), iteration));
        }

        if critique.score >= config.story_approval_score {
            previous = Some((draft, critique));
            break;
        }
        previous = Some((draft, critique));
    }

    let (content, critique, winning_iteration) =
        best.ok_or_else(|| CoreError::OrchestrationFailed("story phase produced no draft".into()))?;
    if content.trim().is_empty() {
        return Err(CoreError::OrchestrationFailed("story phase produced only empty drafts".into()));
    }

    let status = if critique.score >= config.story_approval_score {
        StoryStatus::Approved
    } else {
        StoryStatus::NeedsRevision
    };

    Ok(StoryPhaseOutput {
        story: Story { content, score: critique.score, status, iteration: winning_iteration },
    })
}

/// Runs Phase 2 Step A — per-scene Writer/Critic loops — then Step B, the
/// cohesion pass (§4.2 Phase 2).
pub async fn run_scene_phase(ctx: &AgentContext, story: &Story, target_duration_seconds: u32, config: &OrchestrationConfig) -> Result<ScenePhaseOutput, CoreError> {
    let suggested_target = ((target_duration_seconds as f64 / 8.0).ceil() as u32).clamp(3, 8);
    let scene_count = run_scene_count(ctx, &story.content, suggested_target).await?;

    let mut approved_scenes: Vec<Scene> = Vec::with_capacity(scene_count as usize);
    let mut approved_contents: Vec<String> = Vec::with_capacity(scene_count as usize);

    for scene_number in 1..=scene_count {
        let mut best: Option<(String, CriticOutput)> = None;
        let mut previous: Option<(String, CriticOutput)> = None;

        for iteration in 1..=config.max_scene_iterations {
            let previous_ref = previous.as_ref().map(|(draft, critique)| (draft.as_str(), critique));
            let draft = run_scene_writer(ctx, &story.content, scene_number, &approved_contents, previous_ref, iteration).await?;
            let critique = run_scene_critic(ctx, &draft, scene_number, iteration).await?;

            let is_better_or_tied = best.as_ref().map(|(_, b)| critique.score >= b.score).unwrap_or(true);
            if is_better_or_tied {
                best = Some((draft.clone(), critique.clone()));
            }

            tracing::info!(generation_id = %ctx.generation_id, scene_number, iteration, score = critique.score, "scene iteration scored");

            let terminate = critique.score >= config.scene_approval_score;
            previous = Some((draft, critique));
            if terminate {
                break;
            }
        }

        let (content, critique) =
            best.ok_or_else(|| CoreError::OrchestrationFailed(format!("scene {scene_number} produced no draft")))?;

        let status = if critique.score >= config.scene_approval_score {
            SceneStatus::Approved
        } else if critique.score >= config.scene_approval_score.saturating_sub(15) {
            SceneStatus::NeedsMinorRevision
        } else {
            SceneStatus::NeedsRevision
        };

        let duration_seconds = pick_scene_duration(target_duration_seconds, scene_count, scene_number);
        approved_contents.push(content.clone());
        approved_scenes.push(Scene { scene_number, duration_seconds, content, enhanced_content: None, score: critique.score, status });
    }

    if approved_scenes.is_empty() {
        return Err(CoreError::OrchestrationFailed("scene phase approved no scenes".into()));
    }

    let mut cohesion = run_scene_cohesor(ctx, &approved_contents, 1).await?;
    tracing::info!(generation_id = %ctx.generation_id, iteration = 1, score = cohesion.overall_cohesion_score, "cohesion pass scored");

    for iteration in 2..=config.max_cohesion_iterations {
        if cohesion.overall_cohesion_score >= config.cohesion_approval_score {
            break;
        }
        for (&scene_number, feedback) in &cohesion.scene_specific_feedback {
            let index = (scene_number as usize).saturating_sub(1);
            let Some(scene) = approved_scenes.get_mut(index) else { continue };
            let critique = CriticOutput {
                score: scene.score,
                status: "needs_revision".to_string(),
                critique: feedback.clone(),
                strengths: Vec::new(),
                improvements: Vec::new(),
                priority_fixes: Vec::new(),
            };
            let revised = run_scene_writer(ctx, &story.content, scene_number, &approved_contents, Some((scene.content.as_str(), &critique)), iteration).await?;
            let revised_critique = run_scene_critic(ctx, &revised, scene_number, iteration).await?;
            scene.content = revised;
            scene.score = revised_critique.score;
            approved_contents[index] = scene.content.clone();
        }
        cohesion = run_scene_cohesor(ctx, &approved_contents, iteration).await?;
        tracing::info!(generation_id = %ctx.generation_id, iteration, score = cohesion.overall_cohesion_score, "cohesion pass scored");
    }

    Ok(ScenePhaseOutput { scenes: approved_scenes, cohesion })
}

/// Picks an allowed per-scene duration (§3) closest to an even split of
/// the requested total across `scene_count` scenes.
fn pick_scene_duration(target_duration_seconds: u32, scene_count: u32, _scene_number: u32) -> u32 {
    let even_share = target_duration_seconds as f64 / scene_count.max(1) as f64;
    *Scene::ALLOWED_DURATIONS
        .iter()
        .min_by(|a, b| {
            let da = (**a as f64 - even_share).abs();
            let db = (**b as f64 - even_share).abs();
            da.partial_cmp(&db).unwrap_or(std::cmp::Ordering::Equal)
        })
        .unwrap_or(&6)
}

/// Runs Phase 3 — Enhancement, Alignment, Sanitization — producing the
/// final `VideoPromptParameters` per scene (§4.2 Phase 3). Writes the
/// post-enhancement, post-alignment text back into each `Scene`'s
/// `enhanced_content` (§3: "populated during Phase 3"), ahead of
/// sanitization so it still reflects the full appearance detail the
/// enhancer/aligner added, not the stripped-down video-model prompt.
pub async fn run_enhancement_phase(
    ctx: &AgentContext,
    scenes: &mut [Scene],
    reference_image_handles: &[String],
    config: &OrchestrationConfig,
) -> Result<Vec<VideoPromptParameters>, CoreError> {
    let originals: Vec<(u32, String)> = scenes.iter().map(|s| (s.scene_number, s.content.clone())).collect();
    let enhanced = run_scene_enhancer(ctx, &originals, config.max_enhancement_concurrency).await?;

    for (original, enhanced_content) in originals.iter().zip(enhanced.iter()) {
        if enhanced_content.len() < original.1.len() {
            return Err(CoreError::OrchestrationFailed(format!(
                "scene {} enhancement was not monotonically expanded",
                original.0
            )));
        }
    }

    let aligned = run_scene_aligner(ctx, &enhanced).await?;

    for (scene, aligned_content) in scenes.iter_mut().zip(aligned.iter()) {
        scene.enhanced_content = Some(aligned_content.clone());
    }

    let with_scene_numbers: Vec<(u32, String)> =
        scenes.iter().map(|s| s.scene_number).zip(aligned.into_iter()).collect();
    let sanitized = run_appearance_sanitizer(&ctx.progress_bus, &ctx.recorder, ctx.generation_id, &with_scene_numbers).await;

    if sanitized.iter().all(|(_, prompt, _)| prompt.trim().is_empty()) {
        return Err(CoreError::OrchestrationFailed("every scene sanitized to an empty prompt".into()));
    }

    let params = sanitized
        .into_iter()
        .zip(scenes.iter())
        .map(|((scene_number, prompt, _removed), scene)| VideoPromptParameters {
            scene_number,
            prompt,
            negative_prompt: VideoPromptParameters::NEGATIVE_PROMPT.to_string(),
            duration_seconds: scene.duration_seconds,
            aspect_ratio: VideoPromptParameters::ASPECT_RATIO.to_string(),
            resolution: VideoPromptParameters::RESOLUTION.to_string(),
            generate_audio: true,
            reference_image_handles: reference_image_handles.to_vec(),
        })
        .collect();

    Ok(params)
}
