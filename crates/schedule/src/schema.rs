//! Serde types for workflow definitions.
//!
//! A workflow file is a mapping from workflow name to its definition:
//!
//! ```yaml
//! ovh.SIMPLE_ETL:
//!   tasks: [EXTRACT, TRANSFORM, LOAD]
//!   periodic:
//!     schedule: 3600
//!     payload: { region: eu }
//!   retention: 30
//! ovh.NIGHTLY_REPORT:
//!   periodic:
//!     schedule: "0 2 * * *"
//!   retention: -1
//! ```
//!
//! Keys the scheduler does not consume (`tasks`, `queue`, ...) are ignored.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Workflow name → definition, ordered by name so compilation is stable.
pub type WorkflowSet = BTreeMap<String, WorkflowSpec>;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WorkflowSpec {
    /// Days of execution history to keep. Absent → process default;
    /// negative → never clean up.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub retention: Option<i64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub periodic: Option<PeriodicSpec>,
}

/// A recurring invocation of a workflow.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PeriodicSpec {
    pub schedule: TriggerSchedule,
    /// Passed verbatim to every run.
    #[serde(default = "empty_payload")]
    pub payload: serde_json::Value,
}

/// Either a fixed interval in seconds or a cron expression.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TriggerSchedule {
    Interval(i64),
    Cron(String),
}

fn empty_payload() -> serde_json::Value {
    serde_json::Value::Object(serde_json::Map::new())
}

impl WorkflowSpec {
    pub fn every(seconds: i64) -> Self {
        Self {
            retention: None,
            periodic: Some(PeriodicSpec {
                schedule: TriggerSchedule::Interval(seconds),
                payload: empty_payload(),
            }),
        }
    }

    pub fn with_retention(mut self, days: i64) -> Self {
        self.retention = Some(days);
        self
    }

    pub fn with_payload(mut self, payload: serde_json::Value) -> Self {
        if let Some(periodic) = self.periodic.as_mut() {
            periodic.payload = payload;
        }
        self
    }
}
