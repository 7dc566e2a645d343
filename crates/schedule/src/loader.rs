//! Workflow file loader.

use std::fs;
use std::path::{Path, PathBuf};

use tracing::info;

use crate::compiler::compile;
use crate::directive::CompiledSchedule;
use crate::error::ScheduleError;
use crate::schema::WorkflowSet;

/// Reads the workflow definition file once at startup.
#[derive(Debug, Clone)]
pub struct WorkflowLoader {
    path: PathBuf,
}

impl WorkflowLoader {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Parse the file into a workflow set. An empty file is an empty set.
    pub fn load(&self) -> Result<WorkflowSet, ScheduleError> {
        let content = fs::read_to_string(&self.path).map_err(|source| ScheduleError::Io {
            path: self.path.clone(),
            source,
        })?;
        let workflows = parse_workflows(&content)?;
        info!(
            path = %self.path.display(),
            workflows = workflows.len(),
            "loaded workflow definitions"
        );
        Ok(workflows)
    }

    /// Load and compile in one step.
    pub fn compile(&self, default_retention_days: i64) -> Result<CompiledSchedule, ScheduleError> {
        compile(&self.load()?, default_retention_days)
    }
}

/// Parse workflow YAML from a string.
pub fn parse_workflows(content: &str) -> Result<WorkflowSet, ScheduleError> {
    if content.trim().is_empty() {
        return Ok(WorkflowSet::new());
    }
    Ok(serde_yaml::from_str(content)?)
}
