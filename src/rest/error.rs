//! API error types and responses.
//!
//! Every failure is rendered as `{"error": message}` with a status that tells
//! the caller whose fault it was.

use axum::{
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::images::ImageError;
use crate::wizard::WizardError;

/// API error types
#[derive(Debug)]
pub enum ApiError {
    /// Request body could not be read
    BadRequest(String),
    /// Request was readable but its content is unusable
    ValidationError(String),
    /// Session is busy or the move is illegal from its current step
    Conflict(String),
    /// Configuration, upstream, or unexpected failure
    InternalError(String),
}

/// Error response body
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ErrorResponse {
    pub error: String,
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) | ApiError::ValidationError(_) => StatusCode::BAD_REQUEST,
            ApiError::Conflict(_) => StatusCode::CONFLICT,
            ApiError::InternalError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let error = match self {
            ApiError::BadRequest(msg)
            | ApiError::ValidationError(msg)
            | ApiError::Conflict(msg)
            | ApiError::InternalError(msg) => msg,
        };

        if status.is_server_error() {
            tracing::error!(status = status.as_u16(), error = %error, "Request failed");
        }

        (status, Json(ErrorResponse { error })).into_response()
    }
}

impl From<ImageError> for ApiError {
    fn from(err: ImageError) -> Self {
        if err.is_validation() {
            ApiError::ValidationError(err.to_string())
        } else {
            ApiError::InternalError(err.to_string())
        }
    }
}

impl From<WizardError> for ApiError {
    fn from(err: WizardError) -> Self {
        match err {
            WizardError::IllegalTransition { .. } | WizardError::Busy => {
                ApiError::Conflict(err.to_string())
            }
            WizardError::InvalidForm(e) => ApiError::ValidationError(e.to_string()),
            WizardError::Generation(e) => ApiError::from(e),
            WizardError::Synthesis(_) | WizardError::Storage(_) => {
                ApiError::InternalError(err.to_string())
            }
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

impl From<anyhow::Error> for ApiError {
    fn from(err: anyhow::Error) -> Self {
        ApiError::InternalError(format!("{err:#}"))
    }
}
