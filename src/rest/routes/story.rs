//! Stateless story synthesis.

use axum::{extract::rejection::JsonRejection, Json};

use crate::rest::dto::GenerateStoryRequest;
use crate::rest::error::{ApiError, ErrorResponse};
use crate::story::{synthesize, Story};

/// Synthesize a story outline from a form
#[utoipa::path(
    post,
    path = "/generate-story",
    tag = "Generation",
    request_body = GenerateStoryRequest,
    responses(
        (status = 200, description = "Synthesized story", body = Story),
        (status = 400, description = "Missing form or unreadable request body", body = ErrorResponse),
        (status = 500, description = "Synthesis failed", body = ErrorResponse)
    )
)]
pub async fn generate_story(
    payload: Result<Json<GenerateStoryRequest>, JsonRejection>,
) -> Result<Json<Story>, ApiError> {
    let Json(request) = payload?;
    let form = request
        .form
        .ok_or_else(|| ApiError::ValidationError("form is required".to_string()))?;

    let story = synthesize(&form)?;
    tracing::debug!(title = %story.title, scenes = story.outline().len(), "Story generated");
    Ok(Json(story))
}
