//! Streaming progress endpoint (§6.2). Grounded directly on the teacher's
//! `routes::chat::chat_handler`: `Sse<impl Stream<...>>` fed by an
//! `async_stream::stream!` block draining a channel. No auth extractor here
//! — the generation ID is the capability token (§4.3, §9 Open Question 4).

use crate::domain::{AgentInteraction, ProgressEvent};
use crate::progress_bus::BusEvent;
use crate::AppState;
use axum::{
    extract::{Path, State},
    response::sse::{Event, Sse},
};
use futures::stream::Stream;
use serde::Serialize;
use std::convert::Infallible;
use uuid::Uuid;

#[derive(Serialize)]
#[serde(tag = "type")]
enum StreamMessage<'a> {
    #[serde(rename = "progress")]
    Progress {
        step: &'a str,
        status: &'a str,
        progress: u32,
        message: &'a str,
        #[serde(skip_serializing_if = "Option::is_none")]
        data: &'a Option<serde_json::Value>,
        timestamp: chrono::DateTime<chrono::Utc>,
    },
    #[serde(rename = "llm_interaction")]
    Interaction {
        agent: &'a str,
        interaction_type: &'a str,
        content: &'a str,
        metadata: &'a crate::domain::InteractionMetadata,
        timestamp: chrono::DateTime<chrono::Utc>,
    },
}

fn progress_event_json(event: &ProgressEvent) -> String {
    let step = match event.step {
        crate::domain::ProgressStep::Init => "init",
        crate::domain::ProgressStep::Upload => "upload",
        crate::domain::ProgressStep::Story => "story",
        crate::domain::ProgressStep::Scenes => "scenes",
        crate::domain::ProgressStep::VideoParams => "video_params",
        crate::domain::ProgressStep::Videos => "videos",
        crate::domain::ProgressStep::Complete => "complete",
    };
    let status = match event.status {
        crate::domain::ProgressStatus::InProgress => "in_progress",
        crate::domain::ProgressStatus::Completed => "completed",
        crate::domain::ProgressStatus::Failed => "failed",
    };
    let message = StreamMessage::Progress {
        step,
        status,
        progress: event.progress,
        message: &event.message,
        data: &event.data,
        timestamp: event.timestamp,
    };
    serde_json::to_string(&message).unwrap_or_default()
}

fn interaction_json(interaction: &AgentInteraction) -> String {
    let interaction_type = match interaction.interaction_type {
        crate::domain::InteractionType::Prompt => "prompt",
        crate::domain::InteractionType::Response => "response",
    };
    let message = StreamMessage::Interaction {
        agent: &interaction.agent_name,
        interaction_type,
        content: &interaction.content,
        metadata: &interaction.metadata,
        timestamp: interaction.timestamp,
    };
    serde_json::to_string(&message).unwrap_or_default()
}

/// `GET /api/generate/{id}/stream` (§6.2).
pub async fn stream_handler(State(state): State<AppState>, Path(id): Path<Uuid>) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let mut receiver = state.coordinator.progress_bus.subscribe(id).await;

    let sse_stream = async_stream::stream! {
        while let Some(event) = receiver.recv().await {
            let payload = match event {
                BusEvent::Progress(progress) => progress_event_json(&progress),
                BusEvent::Interaction(interaction) => interaction_json(&interaction),
            };
            yield Ok(Event::default().data(payload));
        }
    };

    Sse::new(sse_stream)
}
