//! Parallel Video Synthesizer (§4.5): bounded-concurrency dispatch over
//! per-scene `VideoPromptParameters`, with per-scene retry, content-policy
//! short-circuit, and partial-failure tolerance. Grounded on the
//! `buffer_unordered` fanout pattern used elsewhere in the pack for
//! concurrent per-item external calls, reworked here into explicit
//! `Semaphore` + `tokio::spawn` tasks so an in-flight call can be aborted
//! independently on cancellation (§5 Cancellation, Scenario F).

use crate::config::OrchestrationConfig;
use crate::db::ObjectStore;
use crate::domain::{ProgressEvent, ProgressStatus, ProgressStep, SceneVideo, VideoPromptParameters};
use crate::error::CoreError;
use crate::progress_bus::{BusEvent, ProgressBus};
use crate::providers::video::{VideoModelClient, VideoSynthesisRequest};
use crate::retry::RetryPolicy;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::Semaphore;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

/// Runs the bounded-concurrency synthesis pass (§4.5). Returns one
/// `SceneVideo` per input parameter set, in input order, regardless of
/// completion order.
pub async fn synthesize_scenes(
    video_client: Arc<dyn VideoModelClient>,
    object_store: Arc<dyn ObjectStore>,
    progress_bus: ProgressBus,
    user_id: String,
    generation_id: Uuid,
    params: Vec<VideoPromptParameters>,
    reference_image_data_urls: Vec<String>,
    config: &OrchestrationConfig,
    cancellation: CancellationToken,
) -> Result<Vec<SceneVideo>, CoreError> {
    let total = params.len();
    if total == 0 {
        return Err(CoreError::OrchestrationFailed("no scenes to synthesize".into()));
    }

    let semaphore = Arc::new(Semaphore::new(config.max_synthesis_concurrency.max(1)));
    let completed = Arc::new(AtomicUsize::new(0));
    let mut handles = Vec::with_capacity(total);

    for scene_params in params {
        let semaphore = semaphore.clone();
        let video_client = video_client.clone();
        let object_store = object_store.clone();
        let progress_bus = progress_bus.clone();
        let reference_image_data_urls = reference_image_data_urls.clone();
        let completed = completed.clone();
        let cancellation = cancellation.clone();
        let user_id = user_id.clone();

        let handle = tokio::spawn(async move {
            let _permit = tokio::select! {
                permit = semaphore.acquire_owned() => permit.expect("semaphore never closed"),
                _ = cancellation.cancelled() => return SceneVideo {
                    scene_number: scene_params.scene_number,
                    file_path: None,
                    cost: 0.0,
                    failure_reason: Some("cancelled".to_string()),
                },
            };

            let result = tokio::select! {
                result = synthesize_one(&video_client, &object_store, &user_id, generation_id, &scene_params, &reference_image_data_urls) => result,
                _ = cancellation.cancelled() => Err(CoreError::Cancelled),
            };

            let scene_video = match result {
                Ok((file_path, cost)) => SceneVideo { scene_number: scene_params.scene_number, file_path: Some(file_path), cost, failure_reason: None },
                Err(e) => SceneVideo { scene_number: scene_params.scene_number, file_path: None, cost: 0.0, failure_reason: Some(e.user_message()) },
            };

            let done = completed.fetch_add(1, Ordering::SeqCst) + 1;
            let progress = 70 + ((done as f64 / total as f64) * 25.0) as u32;
            progress_bus
                .publish(
                    generation_id,
                    BusEvent::Progress(ProgressEvent::new(
                        ProgressStep::Videos,
                        ProgressStatus::InProgress,
                        progress.min(95),
                        format!("synthesized {done}/{total} scene clips"),
                    )),
                )
                .await;

            scene_video
        });
        handles.push(handle);
    }

    let mut results = Vec::with_capacity(total);
    for handle in handles {
        results.push(handle.await.map_err(|e| CoreError::OrchestrationFailed(format!("synthesis task panicked: {e}")))?);
    }

    if results.iter().all(|r| !r.succeeded()) {
        return Err(CoreError::OrchestrationFailed("every scene failed video synthesis".into()));
    }

    Ok(results)
}

async fn synthesize_one(
    video_client: &Arc<dyn VideoModelClient>,
    object_store: &Arc<dyn ObjectStore>,
    user_id: &str,
    generation_id: Uuid,
    params: &VideoPromptParameters,
    reference_image_data_urls: &[String],
) -> Result<(String, f64), CoreError> {
    let policy = RetryPolicy::network_default();
    let request = VideoSynthesisRequest::from((params, reference_image_data_urls.to_vec()));

    let result = policy
        .retry(|_| {
            let video_client = video_client.clone();
            let request = request.clone();
            async move { video_client.synthesize(request).await }
        })
        .await?;

    let relative_path = format!("scene_videos/scene_{:02}.mp4", params.scene_number);
    let url = object_store.put(user_id, &generation_id.to_string(), &relative_path, result.media).await?;
    Ok((url, result.cost))
}
