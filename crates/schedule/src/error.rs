use std::path::PathBuf;

use director_core::DirectorError;

/// Errors raised while loading or compiling workflow schedules.
///
/// Every variant is a configuration problem and is meant to abort startup.
#[derive(Debug, thiserror::Error)]
pub enum ScheduleError {
    #[error("failed to read workflow file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid workflow YAML: {0}")]
    Parse(#[from] serde_yaml::Error),

    #[error("workflow '{workflow}': periodic interval must be positive (got {seconds}s)")]
    InvalidInterval { workflow: String, seconds: i64 },

    #[error("workflow '{workflow}': invalid cron expression '{expression}': {reason}")]
    InvalidCron {
        workflow: String,
        expression: String,
        reason: String,
    },

    #[error("invalid workflow '{name}': {reason}")]
    InvalidWorkflow { name: String, reason: String },

    #[error("workflow '{workflow}': retention of {days} days is out of range")]
    RetentionOutOfRange { workflow: String, days: i64 },
}

impl From<ScheduleError> for DirectorError {
    fn from(e: ScheduleError) -> Self {
        DirectorError::ConfigurationInvalid(e.to_string())
    }
}
