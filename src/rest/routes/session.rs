//! Wizard session endpoints.
//!
//! Each mutation returns the session as it stands afterwards. Illegal moves
//! and calls made while a generation is running answer 409.

use axum::{extract::rejection::JsonRejection, extract::State, Json};

use crate::rest::dto::{BackRequest, SessionResponse};
use crate::rest::error::{ApiError, ErrorResponse};
use crate::rest::state::ApiState;
use crate::story::FormPatch;
use crate::wizard::{Session, WizardStep};

fn respond(state: &ApiState, session: Session) -> Json<SessionResponse> {
    Json(SessionResponse::new(session, state.wizard.is_busy()))
}

/// Get the current session
#[utoipa::path(
    get,
    path = "/api/v1/session",
    tag = "Session",
    responses(
        (status = 200, description = "Current session", body = SessionResponse)
    )
)]
pub async fn get_session(State(state): State<ApiState>) -> Json<SessionResponse> {
    let session = state.wizard.snapshot().await;
    respond(&state, session)
}

/// Edit form fields (steps 1 and 2 only)
#[utoipa::path(
    patch,
    path = "/api/v1/session/form",
    tag = "Session",
    request_body = FormPatch,
    responses(
        (status = 200, description = "Form updated", body = SessionResponse),
        (status = 400, description = "Invalid field value", body = ErrorResponse),
        (status = 409, description = "Form is locked at this step, or session busy", body = ErrorResponse)
    )
)]
pub async fn update_form(
    State(state): State<ApiState>,
    payload: Result<Json<FormPatch>, JsonRejection>,
) -> Result<Json<SessionResponse>, ApiError> {
    let Json(patch) = payload?;
    let session = state.wizard.update_form(patch).await?;
    Ok(respond(&state, session))
}

/// Move from Details to Style
#[utoipa::path(
    post,
    path = "/api/v1/session/advance",
    tag = "Session",
    responses(
        (status = 200, description = "Moved to the style step", body = SessionResponse),
        (status = 409, description = "Not on the details step, or session busy", body = ErrorResponse)
    )
)]
pub async fn advance(State(state): State<ApiState>) -> Result<Json<SessionResponse>, ApiError> {
    let session = state.wizard.advance().await?;
    Ok(respond(&state, session))
}

/// Return to an earlier step without discarding anything
#[utoipa::path(
    post,
    path = "/api/v1/session/back",
    tag = "Session",
    request_body = BackRequest,
    responses(
        (status = 200, description = "Moved back", body = SessionResponse),
        (status = 400, description = "Step outside 1-4", body = ErrorResponse),
        (status = 409, description = "Target is not behind the current step, or session busy", body = ErrorResponse)
    )
)]
pub async fn back(
    State(state): State<ApiState>,
    payload: Result<Json<BackRequest>, JsonRejection>,
) -> Result<Json<SessionResponse>, ApiError> {
    let Json(request) = payload?;
    let step = WizardStep::try_from(request.step).map_err(ApiError::ValidationError)?;
    let session = state.wizard.back(step).await?;
    Ok(respond(&state, session))
}

/// Synthesize the storyboard from the form (step 2 -> 3)
#[utoipa::path(
    post,
    path = "/api/v1/session/storyboard",
    tag = "Session",
    responses(
        (status = 200, description = "Storyboard generated", body = SessionResponse),
        (status = 409, description = "Not on the style step, or session busy", body = ErrorResponse),
        (status = 500, description = "Synthesis failed", body = ErrorResponse)
    )
)]
pub async fn generate_storyboard(
    State(state): State<ApiState>,
) -> Result<Json<SessionResponse>, ApiError> {
    let session = state.wizard.generate_storyboard().await?;
    Ok(respond(&state, session))
}

/// Illustrate the storyboard (step 3 -> 4)
#[utoipa::path(
    post,
    path = "/api/v1/session/illustrations",
    tag = "Session",
    responses(
        (status = 200, description = "Illustrations generated", body = SessionResponse),
        (status = 400, description = "Storyboard has no scenes", body = ErrorResponse),
        (status = 409, description = "Not on the storyboard step, or session busy", body = ErrorResponse),
        (status = 500, description = "Provider not configured or upstream failure", body = ErrorResponse)
    )
)]
pub async fn generate_illustrations(
    State(state): State<ApiState>,
) -> Result<Json<SessionResponse>, ApiError> {
    let session = state.wizard.generate_illustrations().await?;
    Ok(respond(&state, session))
}

/// Start over with the default form
#[utoipa::path(
    post,
    path = "/api/v1/session/reset",
    tag = "Session",
    responses(
        (status = 200, description = "Session reset", body = SessionResponse),
        (status = 409, description = "Session busy", body = ErrorResponse)
    )
)]
pub async fn reset(State(state): State<ApiState>) -> Result<Json<SessionResponse>, ApiError> {
    let session = state.wizard.reset().await?;
    Ok(respond(&state, session))
}
