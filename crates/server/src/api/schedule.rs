//! Installed schedule and next fire times.

use std::sync::Arc;

use axum::extract::State;
use axum::Json;
use chrono::Utc;
use serde::Serialize;

use director_schedule::{CompiledSchedule, UpcomingRun};

use crate::state::AppState;

#[derive(Serialize, utoipa::ToSchema)]
pub struct ScheduleResponse {
    pub workflows: usize,
    #[schema(value_type = Object)]
    pub schedule: CompiledSchedule,
    #[schema(value_type = Vec<Object>)]
    pub upcoming: Vec<UpcomingRun>,
}

/// Compiled workflow schedule
#[utoipa::path(
    get,
    path = "/api/schedule",
    tag = "Schedule",
    responses(
        (status = 200, description = "Recurring directives, cleanup directive and next runs", body = ScheduleResponse)
    )
)]
pub async fn schedule(State(state): State<Arc<AppState>>) -> Json<ScheduleResponse> {
    Json(ScheduleResponse {
        workflows: state.workflow_count,
        upcoming: state.schedule.upcoming(Utc::now()),
        schedule: state.schedule.clone(),
    })
}
