//! Image generation errors

use thiserror::Error;

/// Errors that abort an illustration batch
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ImageError {
    /// Nothing to illustrate
    #[error("outline is empty")]
    EmptyOutline,

    /// Credential missing from the environment; no request was made
    #[error("{provider}: not configured ({env} is not set)")]
    NotConfigured { provider: String, env: String },

    /// Transport failure before a response arrived
    #[error("{provider}: network error - {message}")]
    Network { provider: String, message: String },

    /// Upstream answered with a non-success status; `message` is its payload
    #[error("{message}")]
    Upstream {
        provider: String,
        status: u16,
        message: String,
    },

    /// Success status but no usable image in the body
    #[error("{provider}: malformed response - {message}")]
    MalformedResponse { provider: String, message: String },
}

impl ImageError {
    pub fn not_configured(provider: impl Into<String>, env: impl Into<String>) -> Self {
        ImageError::NotConfigured {
            provider: provider.into(),
            env: env.into(),
        }
    }

    pub fn network(provider: impl Into<String>, message: impl Into<String>) -> Self {
        ImageError::Network {
            provider: provider.into(),
            message: message.into(),
        }
    }

    pub fn upstream(provider: impl Into<String>, status: u16, message: impl Into<String>) -> Self {
        ImageError::Upstream {
            provider: provider.into(),
            status,
            message: message.into(),
        }
    }

    pub fn malformed(provider: impl Into<String>, message: impl Into<String>) -> Self {
        ImageError::MalformedResponse {
            provider: provider.into(),
            message: message.into(),
        }
    }

    /// Caller supplied unusable input (4xx semantics)
    pub fn is_validation(&self) -> bool {
        matches!(self, ImageError::EmptyOutline)
    }

    /// Upstream service misbehaved
    pub fn is_upstream(&self) -> bool {
        matches!(
            self,
            ImageError::Upstream { .. }
                | ImageError::MalformedResponse { .. }
                | ImageError::Network { .. }
        )
    }
}
