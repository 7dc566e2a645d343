//! Workflow schedule compilation.
//!
//! This crate provides:
//! - YAML workflow definitions (`periodic` trigger, `retention` policy)
//! - A loader that validates a workflow file before anything is scheduled
//! - [`compile`], which turns the workflow set into recurring-execution
//!   directives plus one consolidated daily cleanup directive
//!
//! Nothing here executes jobs; the output describes what a recurring-task
//! runtime should install in its schedule table.

pub mod compiler;
pub mod cron;
pub mod directive;
pub mod error;
pub mod loader;
pub mod retention;
pub mod schema;

pub use compiler::{compile, ScheduleCompiler};
pub use directive::{Cadence, CleanupDirective, CompiledSchedule, RecurringDirective, UpcomingRun};
pub use error::ScheduleError;
pub use loader::WorkflowLoader;
pub use retention::Retention;
pub use schema::{PeriodicSpec, TriggerSchedule, WorkflowSet, WorkflowSpec};
