//! Route configuration and setup.

use std::sync::Arc;

use anyhow::Result;
use axum::{
    http::{HeaderValue, Method},
    routing::{get, post, put},
    Router,
};
use tower_http::cors::{Any, CorsLayer};
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::trace::TraceLayer;

use crate::handlers;
use crate::state::AppState;

/// Build the application router.
pub fn build_router(state: Arc<AppState>) -> Result<Router> {
    let cors = setup_cors(&state)?;
    let body_limit = state.config.body_limit_bytes;

    let router = Router::new()
        .route("/health", get(handlers::health::health_check))
        .route(
            "/api/documents",
            post(handlers::documents::create_document),
        )
        .route(
            "/api/documents/{id}",
            get(handlers::documents::get_document),
        )
        .route(
            "/api/documents/{id}/download",
            get(handlers::documents::download_url),
        )
        .route(
            "/api/documents/{id}/approve",
            post(handlers::validation::approve_document),
        )
        .route(
            "/api/documents/{id}/reject",
            post(handlers::validation::reject_document),
        )
        .route(
            "/api/documents/local-upload/{token}",
            put(handlers::transfer::local_upload),
        )
        .route(
            "/api/documents/local-download/{token}",
            get(handlers::transfer::local_download),
        )
        .layer(TraceLayer::new_for_http())
        .layer(RequestBodyLimitLayer::new(body_limit))
        .layer(cors)
        .with_state(state);

    Ok(router)
}

fn setup_cors(state: &AppState) -> Result<CorsLayer> {
    let origins = &state.config.cors_origins;
    let cors = if origins.is_empty() || origins.contains(&"*".to_string()) {
        if !origins.is_empty() {
            tracing::warn!("CORS configured to allow all origins - not recommended for production");
        }
        CorsLayer::new()
            .allow_origin(Any)
            .allow_methods([Method::GET, Method::POST, Method::PUT, Method::OPTIONS])
            .allow_headers(Any)
    } else {
        let parsed: Result<Vec<HeaderValue>, _> = origins.iter().map(|o| o.parse()).collect();
        CorsLayer::new()
            .allow_origin(parsed?)
            .allow_methods([Method::GET, Method::POST, Method::PUT, Method::OPTIONS])
            .allow_headers(Any)
    };
    Ok(cors)
}
