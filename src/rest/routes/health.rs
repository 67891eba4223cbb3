//! Health check endpoint.

use axum::{extract::State, Json};

use crate::rest::dto::HealthResponse;
use crate::rest::state::ApiState;

/// Health check endpoint
#[utoipa::path(
    get,
    path = "/api/v1/health",
    tag = "Health",
    responses(
        (status = 200, description = "Service is healthy", body = HealthResponse)
    )
)]
pub async fn health(State(state): State<ApiState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        image_provider: state.provider.name().to_string(),
        image_provider_configured: state.provider.is_configured(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::images::PlaceholderProvider;
    use crate::wizard::MemoryStore;
    use std::sync::Arc;

    #[tokio::test]
    async fn test_health() {
        let state = ApiState::new(
            Config::default(),
            Arc::new(PlaceholderProvider::new()),
            Arc::new(MemoryStore::new()),
        )
        .unwrap();

        let resp = health(State(state)).await;
        assert_eq!(resp.status, "ok");
        assert!(!resp.version.is_empty());
        assert_eq!(resp.image_provider, "placeholder");
        assert!(resp.image_provider_configured);
    }
}
