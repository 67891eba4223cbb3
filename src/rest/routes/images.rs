//! Stateless scene illustration.

use axum::{extract::rejection::JsonRejection, extract::State, Json};

use crate::images::generate_images as illustrate_outline;
use crate::rest::dto::{GenerateImagesRequest, ImagesResponse};
use crate::rest::error::{ApiError, ErrorResponse};
use crate::rest::state::ApiState;
use crate::styles::get_style;

/// Illustrate every scene of an outline with the configured provider
///
/// A request without `style` is illustrated in the first catalog style, the
/// same fallback `get_style` applies to unknown ids. Only a style whose
/// prompt is empty gets the bare `illustrazione` prompt.
#[utoipa::path(
    post,
    path = "/generate-images",
    tag = "Generation",
    request_body = GenerateImagesRequest,
    responses(
        (status = 200, description = "One image per scene, in outline order", body = ImagesResponse),
        (status = 400, description = "Empty outline or unreadable body", body = ErrorResponse),
        (status = 500, description = "Provider not configured or upstream failure", body = ErrorResponse)
    )
)]
pub async fn generate_images(
    State(state): State<ApiState>,
    payload: Result<Json<GenerateImagesRequest>, JsonRejection>,
) -> Result<Json<ImagesResponse>, ApiError> {
    let Json(request) = payload?;
    let style = match request.style {
        Some(style) => style,
        None => get_style(None).clone(),
    };

    let images = illustrate_outline(state.provider.as_ref(), &request.outline, &style).await?;
    Ok(Json(ImagesResponse { images }))
}
