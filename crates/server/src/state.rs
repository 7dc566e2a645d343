use std::sync::Arc;

use director_core::Config;
use director_schedule::CompiledSchedule;

use crate::metrics_store::MetricsStore;
use crate::predict::{PredictionCache, Predictor};

/// Shared state handed to every request handler.
pub struct AppState {
    pub config: Config,
    pub predictions: PredictionCache,
    pub predictor: Arc<dyn Predictor>,
    pub metrics: MetricsStore,
    /// Schedule installed at startup.
    pub schedule: CompiledSchedule,
    pub workflow_count: usize,
}
