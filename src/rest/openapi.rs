//! OpenAPI specification builder using utoipa.

use utoipa::OpenApi;

use crate::images::Image;
use crate::rest::dto::{
    BackRequest, GenerateImagesRequest, GenerateStoryRequest, HealthResponse, ImagesResponse,
    SessionResponse,
};
use crate::rest::error::ErrorResponse;
use crate::story::{FormPatch, FormState, ReaderAge, Scene, Story, StoryType};
use crate::styles::Style;
use crate::wizard::Session;

/// OpenAPI documentation for the fiabe REST API
#[derive(OpenApi)]
#[openapi(
    info(
        title = "Fiabe API",
        description = "Story outline synthesis and scene illustration, plus the four-step story wizard.",
        license(name = "MIT")
    ),
    paths(
        // Generation endpoints
        crate::rest::routes::story::generate_story,
        crate::rest::routes::images::generate_images,
        // Health and catalog
        crate::rest::routes::health::health,
        crate::rest::routes::styles::list,
        // Session endpoints
        crate::rest::routes::session::get_session,
        crate::rest::routes::session::update_form,
        crate::rest::routes::session::advance,
        crate::rest::routes::session::back,
        crate::rest::routes::session::generate_storyboard,
        crate::rest::routes::session::generate_illustrations,
        crate::rest::routes::session::reset,
    ),
    components(
        schemas(
            // Domain types
            Style,
            StoryType,
            ReaderAge,
            FormState,
            FormPatch,
            Scene,
            Story,
            Image,
            Session,
            // Request types
            GenerateStoryRequest,
            GenerateImagesRequest,
            BackRequest,
            // Response types
            ImagesResponse,
            SessionResponse,
            HealthResponse,
            ErrorResponse,
        )
    ),
    tags(
        (name = "Generation", description = "Stateless story and illustration generation"),
        (name = "Session", description = "Wizard session state machine"),
        (name = "Styles", description = "Illustration style catalog"),
        (name = "Health", description = "Health check"),
    )
)]
pub struct ApiDoc;

impl ApiDoc {
    /// Generate the OpenAPI specification as a JSON string
    pub fn json() -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(&Self::openapi())
    }

    /// Generate the OpenAPI specification as a YAML string
    pub fn yaml() -> Result<String, serde_yaml::Error> {
        serde_yaml::to_string(&Self::openapi())
    }
}
