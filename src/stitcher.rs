//! Video Stitcher (§4.6, §9 "Scoped resource release for loaded clips").
//! Deterministic transition-driven composition delegating the actual
//! encode to a `VideoEncoder` collaborator, since the concrete encoder
//! binary is an external dependency of the process, not of this crate's
//! logic (§1 — video editing tooling is out of scope beyond the three
//! canonical transitions).

use crate::config::OrchestrationConfig;
use crate::db::ObjectStore;
use crate::domain::{CohesionReport, TransitionKind};
use crate::error::CoreError;
use async_trait::async_trait;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use uuid::Uuid;

/// A loaded clip handle. Scoped acquisition: `load_clip` opens it, `Drop`
/// releases it deterministically on both the success and failure paths
/// (§9 "Scoped resource release for loaded clips") without a manual
/// try/finally.
struct ClipHandle {
    path: PathBuf,
}

impl Drop for ClipHandle {
    fn drop(&mut self) {
        tracing::debug!(path = %self.path.display(), "releasing stitcher clip handle");
    }
}

async fn load_clip(path: &Path) -> Result<ClipHandle, CoreError> {
    tokio::fs::metadata(path).await.map_err(|e| CoreError::InternalIO(format!("clip {} unreadable: {e}", path.display())))?;
    Ok(ClipHandle { path: path.to_path_buf() })
}

/// The composition/encode collaborator. The concrete media toolchain
/// (ffmpeg or equivalent) is out of scope (§1); this boundary lets the
/// deterministic transition-planning logic be tested without invoking one.
#[async_trait]
pub trait VideoEncoder: Send + Sync {
    async fn encode(&self, clips: &[PathBuf], durations: &[f64], transitions: &[TransitionKind], output_path: &Path, config: &OrchestrationConfig) -> Result<(), CoreError>;
}

/// Default encoder shelling out to `ffmpeg`, mirroring the shape of this
/// crate's other default collaborators: a thin adapter over a single
/// external call, with the transition/timing arithmetic of §4.6 expressed
/// as an argument list rather than embedded control flow.
pub struct FfmpegEncoder {
    pub ffmpeg_binary: String,
}

impl Default for FfmpegEncoder {
    fn default() -> Self {
        Self { ffmpeg_binary: "ffmpeg".to_string() }
    }
}

#[async_trait]
impl VideoEncoder for FfmpegEncoder {
    async fn encode(&self, clips: &[PathBuf], durations: &[f64], transitions: &[TransitionKind], output_path: &Path, config: &OrchestrationConfig) -> Result<(), CoreError> {
        if clips.len() != transitions.len() + 1 || clips.len() != durations.len() {
            return Err(CoreError::InternalIO("clip count, duration count, and transition count disagree".into()));
        }

        let mut command = tokio::process::Command::new(&self.ffmpeg_binary);
        command.arg("-y");
        for clip in clips {
            command.arg("-i").arg(clip);
        }

        let filter = build_filter_complex(durations, transitions, config);
        command.arg("-filter_complex").arg(filter);
        command
            .arg("-map")
            .arg("[vout]")
            .arg("-map")
            .arg("[aout]")
            .arg("-r")
            .arg(config.stitch_fps.to_string())
            .arg("-b:v")
            .arg(format!("{}k", config.stitch_bitrate_kbps))
            .arg("-c:a")
            .arg("aac")
            .arg(output_path);

        let status = command
            .status()
            .await
            .map_err(|e| CoreError::InternalIO(format!("failed to spawn ffmpeg: {e}")))?;
        if !status.success() {
            return Err(CoreError::InternalIO(format!("ffmpeg exited with status {status}")));
        }
        Ok(())
    }
}

/// The minimum duration fed to `xfade` for a `Cut` transition. `xfade`
/// requires a strictly positive duration; this stands in for an
/// instantaneous cut without special-casing the filter chain shape.
const CUT_XFADE_EPSILON_SECONDS: f64 = 0.04;

fn xfade_transition_name(kind: &TransitionKind) -> &'static str {
    match kind {
        TransitionKind::Crossfade => "fade",
        TransitionKind::Fade => "fadeblack",
        TransitionKind::Cut => "fade",
    }
}

/// Builds the `-filter_complex` graph: a chained `xfade` per adjacent pair
/// at the crossfade/fade-through-black/cut timing from §4.6, a `concat`
/// over the audio streams (transitions are a video-only concern here), and
/// the fixed-duration intro/outro fades on the final video output.
fn build_filter_complex(durations: &[f64], transitions: &[TransitionKind], config: &OrchestrationConfig) -> String {
    let clip_count = durations.len();
    let mut parts = Vec::new();

    parts.push(format!("[0:v]fade=t=in:d={}[vtmp0]", config.stitch_edge_fade_seconds));

    let mut label = "vtmp0".to_string();
    let mut cumulative = durations[0];
    for (index, transition) in transitions.iter().enumerate() {
        let next_clip_index = index + 1;
        let duration = if matches!(transition, TransitionKind::Cut) {
            CUT_XFADE_EPSILON_SECONDS
        } else {
            transition.duration_seconds()
        };
        let offset = (cumulative - duration).max(0.0);
        let next_label = format!("vtmp{next_clip_index}");
        parts.push(format!(
            "[{label}][{next_clip_index}:v]xfade=transition={}:duration={duration}:offset={offset}[{next_label}]",
            xfade_transition_name(transition)
        ));
        cumulative = cumulative + durations[next_clip_index] - duration;
        label = next_label;
    }

    let outro_start = (cumulative - config.stitch_edge_fade_seconds).max(0.0);
    parts.push(format!("[{label}]fade=t=out:st={outro_start}:d={}[vout]", config.stitch_edge_fade_seconds));

    let audio_inputs: String = (0..clip_count).map(|i| format!("[{i}:a]")).collect();
    parts.push(format!("{audio_inputs}concat=n={clip_count}:v=0:a=1[aout]"));

    parts.join(";")
}

/// Derives the final transitions list for the present (post-synthesis)
/// scene sequence from the original `CohesionReport` pairwise scores
/// (§9 Open Question 2, Scenario B): the transition into present scene
/// `b` always comes from the original pairwise record whose `to_scene ==
/// b`, whether or not scenes between `b`'s original predecessor and `b`
/// were dropped. Scores are never averaged or invented.
fn derive_transitions(cohesion: &CohesionReport, present_scene_numbers: &[u32]) -> Vec<TransitionKind> {
    let score_by_to_scene: HashMap<u32, u32> =
        cohesion.pairwise.iter().map(|p| (p.to_scene, p.transition_score)).collect();

    present_scene_numbers
        .windows(2)
        .map(|pair| {
            let to_scene = pair[1];
            let score = score_by_to_scene.get(&to_scene).copied().unwrap_or(cohesion.overall_cohesion_score);
            TransitionKind::from_score(score)
        })
        .collect()
}

/// Stitches the successfully synthesized clips into a final video
/// (§4.6). `successful_clips` must already be in scene order; a single
/// unreadable clip fails the whole stitch with no partial recovery
/// (§4.6 Failure modes).
pub async fn stitch_clips(
    encoder: &dyn VideoEncoder,
    object_store: &Arc<dyn ObjectStore>,
    user_id: &str,
    generation_id: Uuid,
    successful_clips: &[(u32, String)],
    scene_durations: &HashMap<u32, u32>,
    cohesion: &CohesionReport,
    config: &OrchestrationConfig,
) -> Result<String, CoreError> {
    if successful_clips.is_empty() {
        return Err(CoreError::OrchestrationFailed("no successful clips to stitch".into()));
    }

    let present_scene_numbers: Vec<u32> = successful_clips.iter().map(|(n, _)| *n).collect();
    let transitions = derive_transitions(cohesion, &present_scene_numbers);

    let mut handles = Vec::with_capacity(successful_clips.len());
    let mut paths = Vec::with_capacity(successful_clips.len());
    let mut durations = Vec::with_capacity(successful_clips.len());
    for (scene_number, _url) in successful_clips {
        let absolute = object_store.resolve(user_id, &generation_id.to_string(), &format!("scene_videos/scene_{scene_number:02}.mp4"));
        let handle = load_clip(&absolute).await?;
        paths.push(handle.path.clone());
        handles.push(handle);
        let duration = *scene_durations
            .get(scene_number)
            .ok_or_else(|| CoreError::OrchestrationFailed(format!("no duration recorded for scene {scene_number}")))?;
        durations.push(duration as f64);
    }

    let timestamp = chrono::Utc::now().format("%Y%m%dT%H%M%SZ");
    let output_relative = format!("final_video_{timestamp}.mp4");
    let output_absolute = object_store.resolve(user_id, &generation_id.to_string(), &output_relative);

    encoder.encode(&paths, &durations, &transitions, &output_absolute, config).await?;

    // Handles drop here, releasing clip resources on the success path;
    // `?` above releases them identically on the failure path.
    drop(handles);

    Ok(object_store.url_for(user_id, &generation_id.to_string(), &output_relative))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::PairwiseTransition;

    fn report_with_pairs(pairs: &[(u32, u32, u32)]) -> CohesionReport {
        CohesionReport {
            overall_cohesion_score: 80,
            pairwise: pairs
                .iter()
                .map(|(from, to, score)| PairwiseTransition { from_scene: *from, to_scene: *to, transition_score: *score, critique: String::new() })
                .collect(),
            global_issues: Vec::new(),
            scene_specific_feedback: HashMap::new(),
        }
    }

    #[test]
    fn derives_transition_for_dropped_scene_from_original_pair() {
        // Original 4 scenes; scene 3 dropped, leaving 1, 2, 4 (Scenario B).
        let cohesion = report_with_pairs(&[(1, 2, 90), (2, 3, 60), (3, 4, 88)]);
        let transitions = derive_transitions(&cohesion, &[1, 2, 4]);
        assert_eq!(transitions.len(), 2);
        assert_eq!(transitions[0], TransitionKind::from_score(90));
        assert_eq!(transitions[1], TransitionKind::from_score(88));
    }

    #[test]
    fn no_gaps_uses_direct_pairwise_scores() {
        let cohesion = report_with_pairs(&[(1, 2, 90), (2, 3, 88)]);
        let transitions = derive_transitions(&cohesion, &[1, 2, 3]);
        assert_eq!(transitions, vec![TransitionKind::Crossfade, TransitionKind::Crossfade]);
    }

    #[test]
    fn filter_complex_emits_real_xfade_and_maps_output() {
        let config = OrchestrationConfig::default();
        let durations = [6.0, 8.0, 4.0];
        let transitions = [TransitionKind::Crossfade, TransitionKind::Cut];
        let filter = build_filter_complex(&durations, &transitions, &config);

        assert!(!filter.contains('#'), "filter graph must not contain stub comment syntax: {filter}");
        assert!(filter.contains("xfade=transition=fade:duration=0.5:offset=5.5"));
        assert!(filter.contains(&format!("xfade=transition=fade:duration={CUT_XFADE_EPSILON_SECONDS}")));
        assert!(filter.contains("[vout]"));
        assert!(filter.contains("concat=n=3:v=0:a=1[aout]"));
    }
}
