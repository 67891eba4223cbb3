//! Style catalog endpoint.

use axum::Json;

use crate::styles::{list_styles, Style};

/// List the illustration styles, in display order
#[utoipa::path(
    get,
    path = "/api/v1/styles",
    tag = "Styles",
    responses(
        (status = 200, description = "All styles", body = Vec<Style>)
    )
)]
pub async fn list() -> Json<Vec<Style>> {
    Json(list_styles().to_vec())
}
