//! Conversation retrieval endpoint (§6.3): the persisted ordered
//! AgentInteraction array for a terminal generation.

use crate::domain::{AgentInteraction, GenerationStatus};
use crate::AppState;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::Serialize;
use uuid::Uuid;

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

/// `GET /api/generate/{id}/conversation` (§6.3). Not-found for an unknown
/// or still-processing generation.
pub async fn conversation_handler(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Vec<AgentInteraction>>, (StatusCode, Json<ErrorResponse>)> {
    let generation = state
        .coordinator
        .generation_store
        .get(id)
        .await
        .map_err(|e| (StatusCode::INTERNAL_SERVER_ERROR, Json(ErrorResponse { error: e.to_string() })))?
        .ok_or_else(|| (StatusCode::NOT_FOUND, Json(ErrorResponse { error: "unknown generation id".to_string() })))?;

    if matches!(generation.status, GenerationStatus::Processing) {
        return Err((StatusCode::NOT_FOUND, Json(ErrorResponse { error: "generation still processing".to_string() })));
    }

    let interactions: Vec<AgentInteraction> = generation
        .llm_conversation_history
        .and_then(|v| serde_json::from_value(v).ok())
        .unwrap_or_default();

    Ok(Json(interactions))
}
