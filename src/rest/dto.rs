//! Data Transfer Objects for the REST API.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::images::Image;
use crate::story::{FormState, Scene};
use crate::styles::Style;
use crate::wizard::Session;

// =============================================================================
// Generation DTOs
// =============================================================================

/// Body of `POST /generate-story`. The form is required; fields inside it
/// are read leniently.
#[derive(Debug, Default, Serialize, Deserialize, ToSchema)]
#[serde(default)]
pub struct GenerateStoryRequest {
    #[schema(required = true)]
    pub form: Option<FormState>,
}

/// Body of `POST /generate-images`
#[derive(Debug, Default, Serialize, Deserialize, ToSchema)]
#[serde(default)]
pub struct GenerateImagesRequest {
    pub outline: Vec<Scene>,
    /// Style to illustrate in; the first catalog style when absent
    pub style: Option<Style>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ImagesResponse {
    pub images: Vec<Image>,
}

// =============================================================================
// Session DTOs
// =============================================================================

/// Body of `POST /api/v1/session/back`
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct BackRequest {
    /// Target step, 1-4; must be lower than the current one
    pub step: u8,
}

/// Current session plus presentation hints
#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SessionResponse {
    #[serde(flatten)]
    pub session: Session,
    pub step_label: String,
    /// Progress bar percentage (25 per step)
    pub progress: u8,
    /// A generation is in flight; mutations will be rejected
    pub busy: bool,
}

impl SessionResponse {
    pub fn new(session: Session, busy: bool) -> Self {
        Self {
            step_label: session.step.label().to_string(),
            progress: session.step.progress(),
            busy,
            session,
        }
    }
}

// =============================================================================
// Health DTOs
// =============================================================================

/// Health check response
#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    /// Active image provider ("openai" or "placeholder")
    pub image_provider: String,
    /// Whether the image provider has its credentials
    pub image_provider_configured: bool,
}
