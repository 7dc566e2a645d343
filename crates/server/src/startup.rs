//! Server startup: schedule compilation and shared state initialization.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use tracing::info;

use director_cache::{BucketedCache, CachePolicy};
use director_core::{Config, DirectorError};
use director_schedule::{CompiledSchedule, ScheduleCompiler, WorkflowLoader};

use crate::metrics_store::MetricsStore;
use crate::predict::{IndexModelPredictor, Predictor};
use crate::state::AppState;

/// Workflow definitions compiled at startup.
pub struct LoadedSchedule {
    pub workflow_count: usize,
    pub schedule: CompiledSchedule,
}

/// Read and compile the workflow file. Any invalid definition aborts
/// startup before a single directive is installed.
pub fn load_schedule(config: &Config, path: Option<PathBuf>) -> anyhow::Result<LoadedSchedule> {
    let path = path.unwrap_or_else(|| config.workflows.file.clone());
    let loader = WorkflowLoader::new(path);

    let workflows = loader.load().map_err(DirectorError::from)?;
    let schedule = ScheduleCompiler::new(config.workflows.default_retention_days)
        .compile(&workflows)
        .map_err(DirectorError::from)
        .with_context(|| format!("compiling {}", loader.path().display()))?;

    Ok(LoadedSchedule {
        workflow_count: workflows.len(),
        schedule,
    })
}

/// Log every compiled directive. The recurring-task runtime is external and
/// reads the table from `AppState.schedule` (served at `/api/schedule`).
pub fn log_schedule(schedule: &CompiledSchedule) {
    for directive in &schedule.recurring {
        info!(
            key = %directive.unique_key,
            task = directive.task,
            workflow = %directive.workflow,
            "scheduled recurring directive"
        );
    }
    match &schedule.cleanup {
        Some(cleanup) => info!(
            key = cleanup.unique_key,
            task = cleanup.task,
            workflows = cleanup.retention.len(),
            "scheduled cleanup directive"
        ),
        None => info!("no workflow keeps a finite retention; cleanup not scheduled"),
    }
}

/// Build `AppState` with the configured search-index/model predictor.
pub fn build_app_state(config: &Config, loaded: LoadedSchedule) -> anyhow::Result<Arc<AppState>> {
    let predictor = IndexModelPredictor::from_config(config).context("building prediction clients")?;
    build_app_state_with(config, loaded, predictor)
}

/// Build `AppState` around an arbitrary predictor.
pub fn build_app_state_with(
    config: &Config,
    loaded: LoadedSchedule,
    predictor: Arc<dyn Predictor>,
) -> anyhow::Result<Arc<AppState>> {
    let policy = CachePolicy::new(config.cache.window(), config.cache.max_entries)
        .context("invalid prediction cache settings")?;
    info!(
        window_secs = policy.window().as_secs(),
        max_entries = policy.max_entries(),
        "prediction cache ready"
    );

    Ok(Arc::new(AppState {
        config: config.clone(),
        predictions: BucketedCache::new(policy),
        predictor,
        metrics: MetricsStore::new(config.storage.metrics_root.clone()),
        schedule: loaded.schedule,
        workflow_count: loaded.workflow_count,
    }))
}
