//! Repository activity prediction: the expensive downstream call the
//! prediction cache protects.
//!
//! [`IndexModelPredictor`] pulls a weekly activity histogram for the
//! repository from the search index, then scores it with the model service.

mod model;
mod search;

use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::info;

use director_cache::BucketedCache;

pub use model::ModelClient;
pub use search::SearchIndexClient;

/// Weeks of history fed to the model.
pub const HISTORY_WEEKS: usize = 12;

/// Cache of predictions keyed by canonical repository URL.
pub type PredictionCache = BucketedCache<String, Prediction, PredictError>;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, utoipa::ToSchema)]
pub struct WeeklyActivity {
    /// Start of the week (RFC 3339).
    pub week_start: String,
    pub events: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, utoipa::ToSchema)]
pub struct Prediction {
    pub repo_url: String,
    /// Model output for the repository's activity trend.
    pub score: f64,
    pub weeks: usize,
    pub activity: Vec<WeeklyActivity>,
    /// RFC 3339 timestamp of the computation.
    pub computed_at: String,
}

/// Downstream failure. `Clone` so one failed computation can be reported to
/// every caller waiting on it.
#[derive(Debug, Clone, thiserror::Error)]
pub enum PredictError {
    #[error("search index request failed: {0}")]
    Search(String),
    #[error("search index error: {status}: {body}")]
    SearchStatus { status: u16, body: String },
    #[error("model request failed: {0}")]
    Model(String),
    #[error("model error: {status}: {body}")]
    ModelStatus { status: u16, body: String },
    #[error("failed to parse response: {0}")]
    Parse(String),
}

/// Computes a prediction for one repository.
#[async_trait]
pub trait Predictor: Send + Sync {
    async fn predict(&self, repo_url: &str) -> Result<Prediction, PredictError>;
}

/// Search-index query followed by a model invocation.
pub struct IndexModelPredictor {
    search: SearchIndexClient,
    model: ModelClient,
    weeks: usize,
}

impl IndexModelPredictor {
    pub fn new(search: SearchIndexClient, model: ModelClient) -> Self {
        Self {
            search,
            model,
            weeks: HISTORY_WEEKS,
        }
    }

    pub fn from_config(config: &director_core::Config) -> Result<Arc<dyn Predictor>, PredictError> {
        let search = SearchIndexClient::from_config(&config.opensearch, config.model.timeout())?;
        let model = ModelClient::from_config(&config.model)?;
        Ok(Arc::new(Self::new(search, model)))
    }
}

#[async_trait]
impl Predictor for IndexModelPredictor {
    async fn predict(&self, repo_url: &str) -> Result<Prediction, PredictError> {
        let activity = self.search.weekly_activity(repo_url, self.weeks).await?;
        let counts: Vec<u64> = activity.iter().map(|w| w.events).collect();
        let score = self.model.score(&counts).await?;

        info!(repo = %repo_url, weeks = activity.len(), score, "computed prediction");

        Ok(Prediction {
            repo_url: repo_url.to_string(),
            score,
            weeks: activity.len(),
            activity,
            computed_at: Utc::now().to_rfc3339(),
        })
    }
}
