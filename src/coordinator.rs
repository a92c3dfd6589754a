//! Generation Coordinator (§4.1): submission validation, scratch-area
//! setup, and background dispatch of the Orchestrator/Synthesizer/Stitcher
//! chain. Grounded on the teacher's `routes::generate` handlers (validate,
//! touch the persistent store, fire the external call) generalized from a
//! synchronous request/response into a detached background task, since the
//! Coordinator must return as soon as the record and queue exist (§4.1
//! point 7) rather than block on the whole pipeline.

use crate::agents::AgentContext;
use crate::config::Config;
use crate::conversation::ConversationRecorder;
use crate::db::{GenerationStore, ObjectStore};
use crate::domain::{
    Generation, GenerationStatus, ProgressEvent, ProgressStatus, ProgressStep, ReferenceImage, Submission,
};
use crate::error::CoreError;
use crate::orchestrator::{run_enhancement_phase, run_scene_phase, run_story_phase};
use crate::progress_bus::{BusEvent, ProgressBus};
use crate::providers::llm::LlmClient;
use crate::providers::video::VideoModelClient;
use crate::stitcher::{stitch_clips, FfmpegEncoder};
use crate::synthesizer::synthesize_scenes;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

const MIN_PROMPT_CHARS: usize = 10;
const MAX_PROMPT_CHARS: usize = 2000;
const MAX_TITLE_CHARS: usize = 200;
const MAX_BRAND_CHARS: usize = 50;

/// Everything the Coordinator needs to validate a submission, persist a
/// record, and drive the background pipeline. Bundled the same way
/// `AgentContext` bundles an agent's dependencies (§9).
#[derive(Clone)]
pub struct Coordinator {
    pub config: Config,
    pub progress_bus: ProgressBus,
    pub recorder: ConversationRecorder,
    pub generation_store: Arc<dyn GenerationStore>,
    pub object_store: Arc<dyn ObjectStore>,
    pub llm: Arc<dyn LlmClient>,
    pub video_client: Arc<dyn VideoModelClient>,
}

impl Coordinator {
    /// Validates and admits a submission, returning its generation ID
    /// immediately; the pipeline itself runs on a detached task (§4.1).
    pub async fn submit(&self, submission: Submission) -> Result<Uuid, CoreError> {
        validate_submission(&submission, &self.config)?;

        let generation_id = submission.client_generation_id.unwrap_or_else(Uuid::new_v4);
        tracing::info!(generation_id = %generation_id, user_id = %submission.user_id, "submission admitted");

        // Idempotent: reuses the queue if a subscriber already connected
        // and created it (§4.1 point 2, §4.3 Scenario D).
        self.progress_bus.create(generation_id).await;

        let generation = Generation::new(generation_id, &submission);
        self.generation_store
            .save(&generation)
            .await
            .map_err(|e| CoreError::InternalIO(e.to_string()))?;

        let reference_handles = self.store_reference_images(&submission, generation_id).await?;

        self.progress_bus
            .publish(generation_id, BusEvent::Progress(ProgressEvent::new(ProgressStep::Init, ProgressStatus::InProgress, 0, "generation created")))
            .await;
        self.progress_bus
            .publish(
                generation_id,
                BusEvent::Progress(ProgressEvent::new(ProgressStep::Upload, ProgressStatus::InProgress, 5, format!("stored {} reference image(s)", reference_handles.len()))),
            )
            .await;
        self.progress_bus
            .publish(generation_id, BusEvent::Progress(ProgressEvent::new(ProgressStep::Upload, ProgressStatus::InProgress, 10, "upload complete")))
            .await;

        let this = self.clone();
        tokio::spawn(async move {
            this.run_pipeline(generation_id, submission, reference_handles).await;
        });

        Ok(generation_id)
    }

    async fn store_reference_images(&self, submission: &Submission, generation_id: Uuid) -> Result<Vec<String>, CoreError> {
        let mut handles = Vec::with_capacity(submission.reference_images.len());
        for (index, image) in submission.reference_images.iter().enumerate() {
            let relative_path = format!("reference_{index}_{}", image.original_name);
            let url = self
                .object_store
                .put(&submission.user_id, &generation_id.to_string(), &relative_path, image.bytes.clone())
                .await?;
            handles.push(url);
        }
        Ok(handles)
    }

    async fn run_pipeline(&self, generation_id: Uuid, submission: Submission, reference_handles: Vec<String>) {
        let started_at = std::time::Instant::now();
        let result = self.run_pipeline_inner(generation_id, &submission, &reference_handles, started_at).await;

        let interactions = self.recorder.clear(generation_id).await;
        let history = serde_json::to_value(&interactions).ok();

        let mut generation = match self.generation_store.get(generation_id).await {
            Ok(Some(g)) => g,
            _ => Generation::new(generation_id, &submission),
        };
        generation.llm_conversation_history = history;
        generation.updated_at = chrono::Utc::now();
        generation.generation_time_seconds = Some(started_at.elapsed().as_secs_f64());

        match result {
            Ok(outcome) => {
                tracing::info!(generation_id = %generation_id, num_scenes = outcome.num_scenes, story_score = outcome.story_score, cohesion_score = outcome.cohesion_score, "generation completed");
                generation.status = GenerationStatus::Completed;
                generation.final_video_path = Some(outcome.final_video_path.clone());
                generation.scene_video_paths = outcome.scene_video_paths.clone();
                generation.num_scenes = Some(outcome.num_scenes);
                generation.story_score = Some(outcome.story_score);
                generation.cohesion_score = Some(outcome.cohesion_score);

                let _ = self.generation_store.save(&generation).await;

                let data = serde_json::json!({
                    "final_video_path": outcome.final_video_path,
                    "scene_videos": outcome.scene_video_paths,
                    "num_scenes": outcome.num_scenes,
                    "story_score": outcome.story_score,
                    "cohesion_score": outcome.cohesion_score,
                });
                self.progress_bus
                    .publish(
                        generation_id,
                        BusEvent::Progress(ProgressEvent::new(ProgressStep::Complete, ProgressStatus::Completed, 100, "generation complete").with_data(data)),
                    )
                    .await;
            }
            Err((step, e)) => {
                tracing::error!(generation_id = %generation_id, step = ?step, error = %e, "generation failed");
                generation.status = GenerationStatus::Failed;
                generation.error_message = Some(e.user_message());
                let _ = self.generation_store.save(&generation).await;

                self.progress_bus
                    .publish(generation_id, BusEvent::Progress(ProgressEvent::new(step, ProgressStatus::Failed, 0, e.user_message())))
                    .await;
            }
        }

        self.progress_bus.close(generation_id).await;
    }

    async fn run_pipeline_inner(
        &self,
        generation_id: Uuid,
        submission: &Submission,
        reference_handles: &[String],
        _started_at: std::time::Instant,
    ) -> Result<PipelineOutcome, (ProgressStep, CoreError)> {
        let mut config = self.config.orchestration.clone();
        config.max_story_iterations = submission.max_story_iterations.max(1);

        let reference_image_data_urls: Vec<String> = submission
            .reference_images
            .iter()
            .map(ReferenceImage::to_data_url)
            .collect();

        let ctx = AgentContext {
            llm: self.llm.clone(),
            progress_bus: self.progress_bus.clone(),
            recorder: self.recorder.clone(),
            generation_id,
            model: self.config.llm_model.clone(),
        };

        self.progress_bus
            .publish(generation_id, BusEvent::Progress(ProgressEvent::new(ProgressStep::Story, ProgressStatus::InProgress, 15, "writing story")))
            .await;
        let story_output = run_story_phase(&ctx, &submission.prompt, &reference_image_data_urls, &config)
            .await
            .map_err(|e| (ProgressStep::Story, e))?;

        if !submission.generate_scenes {
            return Ok(PipelineOutcome {
                final_video_path: String::new(),
                scene_video_paths: Vec::new(),
                num_scenes: 0,
                story_score: story_output.story.score,
                cohesion_score: 0,
            });
        }

        self.progress_bus
            .publish(generation_id, BusEvent::Progress(ProgressEvent::new(ProgressStep::Scenes, ProgressStatus::InProgress, 40, "writing scenes")))
            .await;
        let mut scene_output = run_scene_phase(&ctx, &story_output.story, submission.target_duration_seconds, &config)
            .await
            .map_err(|e| (ProgressStep::Scenes, e))?;

        if !submission.generate_videos {
            return Ok(PipelineOutcome {
                final_video_path: String::new(),
                scene_video_paths: Vec::new(),
                num_scenes: scene_output.scenes.len() as u32,
                story_score: story_output.story.score,
                cohesion_score: scene_output.cohesion.overall_cohesion_score,
            });
        }

        self.progress_bus
            .publish(generation_id, BusEvent::Progress(ProgressEvent::new(ProgressStep::VideoParams, ProgressStatus::InProgress, 60, "preparing synthesis prompts")))
            .await;
        let params = run_enhancement_phase(&ctx, &mut scene_output.scenes, reference_handles, &config)
            .await
            .map_err(|e| (ProgressStep::VideoParams, e))?;

        self.progress_bus
            .publish(generation_id, BusEvent::Progress(ProgressEvent::new(ProgressStep::Videos, ProgressStatus::InProgress, 70, "synthesizing scene clips")))
            .await;
        let cancellation = CancellationToken::new();
        let scene_videos = synthesize_scenes(
            self.video_client.clone(),
            self.object_store.clone(),
            self.progress_bus.clone(),
            submission.user_id.clone(),
            generation_id,
            params,
            reference_image_data_urls,
            &config,
            cancellation,
        )
        .await
        .map_err(|e| (ProgressStep::Videos, e))?;

        let successful_clips: Vec<(u32, String)> = scene_videos
            .iter()
            .filter(|v| v.succeeded())
            .map(|v| (v.scene_number, v.file_path.clone().unwrap()))
            .collect();

        let scene_durations: std::collections::HashMap<u32, u32> =
            scene_output.scenes.iter().map(|s| (s.scene_number, s.duration_seconds)).collect();

        let encoder = FfmpegEncoder::default();
        let final_video_path = stitch_clips(
            &encoder,
            &self.object_store,
            &submission.user_id,
            generation_id,
            &successful_clips,
            &scene_durations,
            &scene_output.cohesion,
            &config,
        )
        .await
        .map_err(|e| (ProgressStep::Videos, e))?;

        Ok(PipelineOutcome {
            final_video_path,
            scene_video_paths: successful_clips.into_iter().map(|(_, path)| path).collect(),
            num_scenes: scene_output.scenes.len() as u32,
            story_score: story_output.story.score,
            cohesion_score: scene_output.cohesion.overall_cohesion_score,
        })
    }
}

struct PipelineOutcome {
    final_video_path: String,
    scene_video_paths: Vec<String>,
    num_scenes: u32,
    story_score: u32,
    cohesion_score: u32,
}

/// Validates a submission against §6.1's bounds, failing fast with
/// `InvalidInput` (§4.1).
fn validate_submission(submission: &Submission, config: &Config) -> Result<(), CoreError> {
    let prompt_len = submission.prompt.chars().count();
    if !(MIN_PROMPT_CHARS..=MAX_PROMPT_CHARS).contains(&prompt_len) {
        return Err(CoreError::InvalidInput(format!(
            "prompt must be {MIN_PROMPT_CHARS}-{MAX_PROMPT_CHARS} characters, got {prompt_len}"
        )));
    }
    if let Some(title) = &submission.title {
        if title.chars().count() > MAX_TITLE_CHARS {
            return Err(CoreError::InvalidInput(format!("title exceeds {MAX_TITLE_CHARS} characters")));
        }
    }
    if let Some(brand) = &submission.brand_name {
        if brand.chars().count() > MAX_BRAND_CHARS {
            return Err(CoreError::InvalidInput(format!("brand_name exceeds {MAX_BRAND_CHARS} characters")));
        }
    }
    if submission.reference_images.len() > config.orchestration.max_reference_images {
        return Err(CoreError::InvalidInput(format!(
            "at most {} reference images allowed, got {}",
            config.orchestration.max_reference_images,
            submission.reference_images.len()
        )));
    }
    for image in &submission.reference_images {
        if image.bytes.len() > config.orchestration.max_image_bytes {
            return Err(CoreError::InvalidInput(format!(
                "reference image {} exceeds {} bytes",
                image.original_name, config.orchestration.max_image_bytes
            )));
        }
    }
    if ![15, 30, 45, 60].contains(&submission.target_duration_seconds) {
        return Err(CoreError::InvalidInput("target_duration_seconds must be one of 15, 30, 45, 60".into()));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ReferenceImageMime;

    fn base_submission() -> Submission {
        Submission {
            user_id: "user-1".to_string(),
            prompt: "a".repeat(20),
            target_duration_seconds: 30,
            ..Submission::default()
        }
    }

    #[test]
    fn rejects_short_prompt() {
        let config = Config::from_env().unwrap_or_else(|_| test_config());
        let mut submission = base_submission();
        submission.prompt = "too short".to_string();
        assert!(matches!(validate_submission(&submission, &config), Err(CoreError::InvalidInput(_))));
    }

    #[test]
    fn rejects_too_many_reference_images() {
        let config = test_config();
        let mut submission = base_submission();
        submission.reference_images = (0..4)
            .map(|i| ReferenceImage { mime_type: ReferenceImageMime::Png, bytes: vec![0], original_name: format!("img{i}.png") })
            .collect();
        assert!(matches!(validate_submission(&submission, &config), Err(CoreError::InvalidInput(_))));
    }

    #[test]
    fn accepts_valid_submission() {
        let config = test_config();
        assert!(validate_submission(&base_submission(), &config).is_ok());
    }

    fn test_config() -> Config {
        Config {
            llm_api_key: String::new(),
            llm_model: "test-model".to_string(),
            llm_endpoint: String::new(),
            video_api_key: String::new(),
            video_endpoint: String::new(),
            auth_public_key: String::new(),
            scratch_base_dir: std::env::temp_dir().to_string_lossy().to_string(),
            environment: crate::config::Environment::Development,
            orchestration: crate::config::OrchestrationConfig::default(),
        }
    }
}
