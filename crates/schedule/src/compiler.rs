//! Workflow set → recurring directives + consolidated cleanup.

use std::collections::BTreeMap;

use tracing::{debug, info};

use crate::cron::{normalize_cron, parse_cron};
use crate::directive::{Cadence, CleanupDirective, CompiledSchedule, RecurringDirective, EXECUTE_TASK};
use crate::error::ScheduleError;
use crate::retention::Retention;
use crate::schema::{TriggerSchedule, WorkflowSet};


/// Compiles workflow sets against a process-wide default retention.
#[derive(Debug, Clone, Copy)]
pub struct ScheduleCompiler {
    default_retention_days: i64,
}

impl ScheduleCompiler {
    pub fn new(default_retention_days: i64) -> Self {
        Self {
            default_retention_days,
        }
    }

    pub fn compile(&self, workflows: &WorkflowSet) -> Result<CompiledSchedule, ScheduleError> {
        compile(workflows, self.default_retention_days)
    }
}

/// Compile `workflows` into schedule directives.
///
/// Every workflow is validated before anything is emitted, so a single bad
/// definition rejects the whole set. The result is a pure function of the
/// input: compiling the same set twice yields identical keys.
pub fn compile(workflows: &WorkflowSet, default_retention_days: i64) -> Result<CompiledSchedule, ScheduleError> {
    let cadences = validate(workflows)?;

    let mut recurring = Vec::with_capacity(cadences.len());
    let mut retention = BTreeMap::new();

    for (name, spec) in workflows {
        if let Retention::Days(days) = Retention::resolve(name, spec.retention, default_retention_days)? {
            retention.insert(name.clone(), days);
        }

        if let (Some(periodic), Some(cadence)) = (&spec.periodic, cadences.get(name.as_str())) {
            let directive = RecurringDirective {
                unique_key: directive_key(name, cadence),
                task: EXECUTE_TASK,
                workflow: name.clone(),
                cadence: cadence.clone(),
                payload: periodic.payload.clone(),
            };
            debug!(key = %directive.unique_key, workflow = %name, "recurring directive");
            recurring.push(directive);
        }
    }

    let cleanup = if retention.is_empty() {
        None
    } else {
        Some(CleanupDirective::daily(retention))
    };

    info!(
        workflows = workflows.len(),
        recurring = recurring.len(),
        cleanup_workflows = cleanup.as_ref().map_or(0, |c| c.retention.len()),
        "compiled workflow schedule"
    );

    Ok(CompiledSchedule { recurring, cleanup })
}

/// Schedule-table key of a recurring directive.
///
/// Includes the cadence so a workflow rescheduled with a different interval
/// gets a new entry instead of silently overwriting the old one.
pub fn directive_key(workflow: &str, cadence: &Cadence) -> String {
    match cadence {
        Cadence::Every { seconds } => format!("periodic-{}-{}s", workflow, seconds),
        Cadence::Cron { expression } => format!("periodic-{}-{}", workflow, expression),
    }
}

/// Check names, triggers and retention of every workflow; return the
/// cadence of each periodic one.
fn validate(workflows: &WorkflowSet) -> Result<BTreeMap<&str, Cadence>, ScheduleError> {
    let mut cadences = BTreeMap::new();

    for (name, spec) in workflows {
        if name.trim().is_empty() {
            return Err(ScheduleError::InvalidWorkflow {
                name: name.clone(),
                reason: "workflow name must not be empty".into(),
            });
        }
        if name.chars().any(char::is_whitespace) {
            return Err(ScheduleError::InvalidWorkflow {
                name: name.clone(),
                reason: "workflow name must not contain whitespace".into(),
            });
        }

        // Surfaces out-of-range values before any directive is built.
        Retention::resolve(name, spec.retention, 0)?;

        let Some(periodic) = &spec.periodic else {
            continue;
        };
        let cadence = match &periodic.schedule {
            TriggerSchedule::Interval(seconds) => {
                let seconds = u64::try_from(*seconds)
                    .ok()
                    .filter(|s| *s > 0)
                    .ok_or_else(|| ScheduleError::InvalidInterval {
                        workflow: name.clone(),
                        seconds: *seconds,
                    })?;
                Cadence::Every { seconds }
            }
            TriggerSchedule::Cron(expression) => {
                parse_cron(expression).map_err(|e| ScheduleError::InvalidCron {
                    workflow: name.clone(),
                    expression: expression.clone(),
                    reason: e.to_string(),
                })?;
                Cadence::Cron {
                    expression: normalize_cron(expression),
                }
            }
        };
        cadences.insert(name.as_str(), cadence);
    }

    Ok(cadences)
}
