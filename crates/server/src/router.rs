//! HTTP router construction.
//!
//! Assembles all Axum routes, middleware, and OpenAPI docs into a single `Router`.

use std::sync::Arc;

use axum::routing::get;
use axum::Router;
use tower_http::cors::{Any, CorsLayer};
use utoipa::OpenApi;
use utoipa_scalar::{Scalar, Servable};

use crate::api;
use crate::state::AppState;

/// Build the complete application router with all routes and middleware.
pub fn build_router(state: Arc<AppState>) -> Router {
    let cors = cors_layer(&state.config.server.cors_origin);

    Router::new()
        .route("/health", get(api::health))
        // Static route wins over the wildcard below.
        .route("/api/compass/ping", get(api::ping))
        .route("/api/compass/{*rest}", get(api::compass_dispatch))
        .route("/api/schedule", get(api::schedule))
        .route("/api/cache/stats", get(api::cache_stats))
        .layer(cors)
        .with_state(state)
        .merge(Scalar::with_url("/docs", api::doc::ApiDoc::openapi()))
}

fn cors_layer(origin: &str) -> CorsLayer {
    if origin == "*" {
        return CorsLayer::permissive();
    }
    match origin.parse::<axum::http::HeaderValue>() {
        Ok(value) => CorsLayer::new().allow_origin(value).allow_methods(Any).allow_headers(Any),
        Err(e) => {
            tracing::warn!("invalid CORS_ORIGIN '{}' ({}), allowing any origin", origin, e);
            CorsLayer::permissive()
        }
    }
}
