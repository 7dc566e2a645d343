//! Prediction cache counters.

use std::sync::Arc;

use axum::extract::State;
use axum::Json;
use serde::Serialize;

use director_cache::CacheStats;

use crate::state::AppState;

#[derive(Serialize, utoipa::ToSchema)]
pub struct CacheStatsResponse {
    #[schema(value_type = Object)]
    pub stats: CacheStats,
    pub hit_rate: f64,
}

/// Prediction cache statistics
#[utoipa::path(
    get,
    path = "/api/cache/stats",
    tag = "Cache",
    responses(
        (status = 200, description = "Hit, miss, coalesce and eviction counters", body = CacheStatsResponse)
    )
)]
pub async fn cache_stats(State(state): State<Arc<AppState>>) -> Json<CacheStatsResponse> {
    let stats = state.predictions.stats();
    Json(CacheStatsResponse {
        hit_rate: stats.hit_rate(),
        stats,
    })
}
