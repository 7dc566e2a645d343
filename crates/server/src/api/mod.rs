//! HTTP endpoint modules.
//!
//! Shared error body lives here; each sub-module owns one area.

pub mod cache;
pub mod compass;
pub mod doc;
pub mod health;
pub mod schedule;

use axum::http::StatusCode;
use axum::Json;
use serde::Serialize;

#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct ErrorResponse {
    pub error: String,
}

pub(crate) type ApiError = (StatusCode, Json<ErrorResponse>);

pub(crate) fn api_error(status: StatusCode, error: impl ToString) -> ApiError {
    (
        status,
        Json(ErrorResponse {
            error: error.to_string(),
        }),
    )
}

pub use cache::cache_stats;
pub use compass::{compass_dispatch, ping};
pub use health::health;
pub use schedule::schedule;
