//! Submission and polling-retrieval endpoints (§6.1, §6.3). Grounded on the
//! teacher's `routes::generate` handlers: extract auth, validate, call into
//! the collaborator, map errors into an HTTP response.

use crate::auth::AuthenticatedCaller;
use crate::domain::{Generation, ReferenceImage, ReferenceImageMime, Submission};
use crate::error::CoreError;
use crate::AppState;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Deserialize)]
pub struct ReferenceImageInput {
    pub mime_type: String,
    /// Base64-encoded image bytes, matching the existing UI's upload shape.
    pub data: String,
    pub original_name: String,
}

#[derive(Debug, Deserialize)]
pub struct SubmitGenerationRequest {
    pub prompt: String,
    pub title: Option<String>,
    pub brand_name: Option<String>,
    #[serde(default)]
    pub reference_images: Vec<ReferenceImageInput>,
    pub client_generation_id: Option<Uuid>,
    pub max_story_iterations: Option<u32>,
    pub generate_scenes: Option<bool>,
    pub generate_videos: Option<bool>,
    pub target_duration_seconds: Option<u32>,
}

#[derive(Debug, Serialize)]
pub struct SubmitGenerationResponse {
    pub generation_id: Uuid,
    pub status: &'static str,
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

fn error_response(status: StatusCode, message: impl Into<String>) -> (StatusCode, Json<ErrorResponse>) {
    (status, Json(ErrorResponse { error: message.into() }))
}

fn status_for(error: &CoreError) -> StatusCode {
    match error {
        CoreError::InvalidInput(_) => StatusCode::BAD_REQUEST,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

/// `POST /api/generate` (§6.1). Validates and admits the submission, then
/// returns immediately with `processing` while the pipeline runs in the
/// background (§4.1 point 7).
pub async fn submit_handler(
    State(state): State<AppState>,
    AuthenticatedCaller(user): AuthenticatedCaller,
    Json(request): Json<SubmitGenerationRequest>,
) -> Result<Json<SubmitGenerationResponse>, (StatusCode, Json<ErrorResponse>)> {
    let mut reference_images = Vec::with_capacity(request.reference_images.len());
    for image in request.reference_images {
        let mime_type = ReferenceImageMime::from_str(&image.mime_type)
            .ok_or_else(|| error_response(StatusCode::BAD_REQUEST, format!("unsupported reference image MIME type: {}", image.mime_type)))?;
        let bytes = {
            use base64::Engine;
            base64::engine::general_purpose::STANDARD
                .decode(&image.data)
                .map_err(|e| error_response(StatusCode::BAD_REQUEST, format!("invalid base64 reference image data: {e}")))?
        };
        reference_images.push(ReferenceImage { mime_type, bytes, original_name: image.original_name });
    }

    let submission = Submission {
        user_id: user.user_id,
        prompt: request.prompt,
        title: request.title,
        brand_name: request.brand_name,
        reference_images,
        client_generation_id: request.client_generation_id,
        max_story_iterations: request.max_story_iterations.unwrap_or(3),
        generate_scenes: request.generate_scenes.unwrap_or(true),
        generate_videos: request.generate_videos.unwrap_or(true),
        target_duration_seconds: request.target_duration_seconds.unwrap_or(30),
    };

    let generation_id = state
        .coordinator
        .submit(submission)
        .await
        .map_err(|e| error_response(status_for(&e), e.user_message()))?;

    Ok(Json(SubmitGenerationResponse { generation_id, status: "processing" }))
}

/// `GET /api/generate/{id}` (§6.3), the polling fallback for when the
/// streaming channel is unreachable.
pub async fn get_generation_handler(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Generation>, (StatusCode, Json<ErrorResponse>)> {
    let generation = state
        .coordinator
        .generation_store
        .get(id)
        .await
        .map_err(|e| error_response(StatusCode::INTERNAL_SERVER_ERROR, e.to_string()))?
        .ok_or_else(|| error_response(StatusCode::NOT_FOUND, "unknown generation id"))?;

    Ok(Json(generation))
}
