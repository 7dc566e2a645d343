//! Compass endpoints: ping, persisted repository metrics and memoized
//! activity predictions.
//!
//! The source URL is itself a path (`https://github.com/org/repo`), so both
//! per-source endpoints share one wildcard route and are told apart by their
//! trailing segment.

use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use tracing::{error, warn};

use director_cache::CacheError;
use director_core::SourceUrl;

use crate::predict::{PredictError, Prediction};
use crate::state::AppState;

use super::{api_error, ApiError, ErrorResponse};

const REPOSITORIES_SUFFIX: &str = "/repositories";
const PREDICTION_SUFFIX: &str = "/prediction";

/// Liveness probe for compass clients
#[utoipa::path(
    get,
    path = "/api/compass/ping",
    tag = "Compass",
    responses(
        (status = 200, description = "Always `{\"result\": \"pong\"}`", body = Object)
    )
)]
pub async fn ping() -> Json<serde_json::Value> {
    Json(json!({ "result": "pong" }))
}

/// Route `/api/compass/{source_url}/{repositories|prediction}`.
pub async fn compass_dispatch(State(state): State<Arc<AppState>>, Path(rest): Path<String>) -> Response {
    if let Some(source) = rest.strip_suffix(REPOSITORIES_SUFFIX) {
        return repositories(state, source).await;
    }
    if let Some(source) = rest.strip_suffix(PREDICTION_SUFFIX) {
        return match prediction(state, source).await {
            Ok(p) => p.into_response(),
            Err(e) => e.into_response(),
        };
    }
    api_error(StatusCode::NOT_FOUND, format!("no compass endpoint at /api/compass/{}", rest)).into_response()
}

/// Persisted metrics snapshot of a repository
#[utoipa::path(
    get,
    path = "/api/compass/{source_url}/repositories",
    tag = "Compass",
    params(("source_url" = String, Path, description = "Repository URL, e.g. https://github.com/org/repo")),
    responses(
        (status = 200, description = "Stored metrics JSON", body = Object),
        (status = 404, description = "No snapshot for this source; body is `{}`", body = Object),
        (status = 500, description = "Snapshot unreadable", body = ErrorResponse)
    )
)]
pub async fn repositories(state: Arc<AppState>, source_url: &str) -> Response {
    match state.metrics.load(source_url).await {
        Ok(Some(metrics)) => Json(metrics).into_response(),
        Ok(None) => (StatusCode::NOT_FOUND, Json(json!({}))).into_response(),
        Err(e) => {
            error!(source = %source_url, "failed to read metrics snapshot: {}", e);
            api_error(StatusCode::INTERNAL_SERVER_ERROR, e).into_response()
        }
    }
}

/// Activity prediction for a repository, memoized per freshness window
#[utoipa::path(
    get,
    path = "/api/compass/{source_url}/prediction",
    tag = "Compass",
    params(("source_url" = String, Path, description = "Repository URL on gitee.com, github.com or raw.githubusercontent.com")),
    responses(
        (status = 200, description = "Prediction for the current window", body = Prediction),
        (status = 400, description = "Unsupported source host", body = ErrorResponse),
        (status = 502, description = "Search index or model failed", body = ErrorResponse)
    )
)]
pub async fn prediction(state: Arc<AppState>, source_url: &str) -> Result<Json<Prediction>, ApiError> {
    let source = SourceUrl::parse(source_url).map_err(|e| {
        warn!(source = %source_url, "rejected prediction request: {}", e);
        api_error(StatusCode::BAD_REQUEST, e)
    })?;

    let key = source.canonical();
    let predictor = Arc::clone(&state.predictor);
    let repo = key.clone();

    state
        .predictions
        .get_or_compute(key, move || async move { predictor.predict(&repo).await })
        .await
        .map(Json)
        .map_err(|e| {
            error!(source = %source, "prediction failed: {}", e);
            prediction_error(e)
        })
}

fn prediction_error(err: CacheError<PredictError>) -> ApiError {
    match err {
        CacheError::Computation(e) => api_error(StatusCode::BAD_GATEWAY, e),
        other => api_error(StatusCode::INTERNAL_SERVER_ERROR, other),
    }
}
