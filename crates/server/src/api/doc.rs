//! OpenAPI documentation aggregator, served via Scalar UI at `/docs`.

use utoipa::OpenApi;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "director API",
        version = "0.1.0",
        description = "Repository metrics, memoized activity predictions and the compiled workflow schedule.",
    ),
    tags(
        (name = "Health", description = "Server liveness"),
        (name = "Compass", description = "Repository metrics snapshots and activity predictions"),
        (name = "Schedule", description = "Recurring workflow directives and retention cleanup"),
        (name = "Cache", description = "Prediction cache counters"),
    ),
    paths(
        crate::api::health::health,
        crate::api::compass::ping,
        crate::api::compass::repositories,
        crate::api::compass::prediction,
        crate::api::schedule::schedule,
        crate::api::cache::cache_stats,
    ),
    components(schemas(
        crate::api::ErrorResponse,
        crate::api::health::HealthResponse,
        crate::api::schedule::ScheduleResponse,
        crate::api::cache::CacheStatsResponse,
        crate::predict::Prediction,
        crate::predict::WeeklyActivity,
    ))
)]
pub struct ApiDoc;
