//! Compiled schedule entries handed to the recurring-task runtime.

use std::collections::BTreeMap;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::cron::parse_cron;

/// Runtime entry point that starts one workflow run.
pub const EXECUTE_TASK: &str = "periodic.execute";
/// Runtime entry point that prunes execution history.
pub const CLEANUP_TASK: &str = "periodic.cleanup";
/// Schedule key of the single cleanup directive.
pub const CLEANUP_KEY: &str = "periodic-cleanup";
/// Every day at 00:00 UTC.
pub const CLEANUP_CRON: &str = "0 0 0 * * *";

/// When a directive fires.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Cadence {
    Every { seconds: u64 },
    /// Normalized 6-field expression, evaluated in UTC.
    Cron { expression: String },
}

impl Cadence {
    /// First fire time strictly after `instant`.
    ///
    /// Interval cadences run relative to their previous run, so the answer
    /// is `instant + interval`. Returns `None` for a cron expression with no
    /// future occurrence.
    pub fn next_after(&self, instant: DateTime<Utc>) -> Option<DateTime<Utc>> {
        match self {
            Cadence::Every { seconds } => {
                let step = chrono::Duration::from_std(Duration::from_secs(*seconds)).ok()?;
                instant.checked_add_signed(step)
            }
            Cadence::Cron { expression } => parse_cron(expression).ok()?.after(&instant).next(),
        }
    }
}

/// One recurring workflow invocation.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RecurringDirective {
    /// Stable identity in the runtime's schedule table, derived from the
    /// workflow name and its cadence.
    pub unique_key: String,
    pub task: &'static str,
    pub workflow: String,
    pub cadence: Cadence,
    pub payload: serde_json::Value,
}

/// The consolidated retention pass.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CleanupDirective {
    pub unique_key: &'static str,
    pub task: &'static str,
    pub cadence: Cadence,
    /// Workflow name → days of history to keep.
    pub retention: BTreeMap<String, u32>,
}

impl CleanupDirective {
    pub fn daily(retention: BTreeMap<String, u32>) -> Self {
        Self {
            unique_key: CLEANUP_KEY,
            task: CLEANUP_TASK,
            cadence: Cadence::Cron {
                expression: CLEANUP_CRON.to_string(),
            },
            retention,
        }
    }
}

/// Output of schedule compilation.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CompiledSchedule {
    /// Ordered by workflow name.
    pub recurring: Vec<RecurringDirective>,
    /// Present only when at least one workflow keeps a finite retention.
    pub cleanup: Option<CleanupDirective>,
}

/// A directive together with its next fire time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UpcomingRun {
    pub unique_key: String,
    pub task: &'static str,
    pub workflow: Option<String>,
    pub next_run: Option<DateTime<Utc>>,
}

impl CompiledSchedule {
    /// Every schedule-table key this compilation installs.
    pub fn keys(&self) -> Vec<&str> {
        self.recurring
            .iter()
            .map(|d| d.unique_key.as_str())
            .chain(self.cleanup.as_ref().map(|c| c.unique_key))
            .collect()
    }

    /// Number of schedule-table entries.
    pub fn len(&self) -> usize {
        self.recurring.len() + usize::from(self.cleanup.is_some())
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn recurring_for(&self, workflow: &str) -> impl Iterator<Item = &RecurringDirective> {
        let workflow = workflow.to_string();
        self.recurring.iter().filter(move |d| d.workflow == workflow)
    }

    /// Next fire time of every directive after `now`.
    pub fn upcoming(&self, now: DateTime<Utc>) -> Vec<UpcomingRun> {
        let mut runs: Vec<UpcomingRun> = self
            .recurring
            .iter()
            .map(|d| UpcomingRun {
                unique_key: d.unique_key.clone(),
                task: d.task,
                workflow: Some(d.workflow.clone()),
                next_run: d.cadence.next_after(now),
            })
            .collect();

        if let Some(cleanup) = &self.cleanup {
            runs.push(UpcomingRun {
                unique_key: cleanup.unique_key.to_string(),
                task: cleanup.task,
                workflow: None,
                next_run: cleanup.cadence.next_after(now),
            });
        }
        runs
    }
}
