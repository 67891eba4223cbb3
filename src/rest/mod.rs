//! REST API for the story wizard.
//!
//! Two stateless generation endpoints (`/generate-story`, `/generate-images`)
//! plus `/api/v1` routes that drive the persisted wizard session.

use std::net::SocketAddr;

use anyhow::{Context, Result};
use axum::{
    routing::{get, patch, post},
    Router,
};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

pub mod dto;
pub mod error;
pub mod openapi;
pub mod routes;
pub mod state;

pub use openapi::ApiDoc;
pub use state::ApiState;

/// Build the API router with all routes
pub fn build_router(state: ApiState) -> Router {
    let mut router = Router::new()
        // Stateless generation endpoints
        .route("/generate-story", post(routes::story::generate_story))
        .route("/generate-images", post(routes::images::generate_images))
        // Health and catalog
        .route("/api/v1/health", get(routes::health::health))
        .route("/api/v1/styles", get(routes::styles::list))
        // Wizard session
        .route("/api/v1/session", get(routes::session::get_session))
        .route("/api/v1/session/form", patch(routes::session::update_form))
        .route("/api/v1/session/advance", post(routes::session::advance))
        .route("/api/v1/session/back", post(routes::session::back))
        .route(
            "/api/v1/session/storyboard",
            post(routes::session::generate_storyboard),
        )
        .route(
            "/api/v1/session/illustrations",
            post(routes::session::generate_illustrations),
        )
        .route("/api/v1/session/reset", post(routes::session::reset))
        .layer(TraceLayer::new_for_http());

    if state.config.rest_api.cors {
        let cors = CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any);
        router = router.layer(cors);
    }

    router.with_state(state)
}

/// Start the REST API server
pub async fn serve(state: ApiState, port: u16) -> Result<()> {
    let app = build_router(state);
    let addr = SocketAddr::from(([0, 0, 0, 0], port));

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;
    tracing::info!("REST API listening on http://{}", addr);

    axum::serve(listener, app).await?;

    Ok(())
}
