//! Retention policy resolution.

use serde::Serialize;

use crate::error::ScheduleError;

/// Effective retention of a workflow's execution history.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Retention {
    /// Delete runs older than this many days. Zero deletes every finished
    /// run on the next cleanup pass.
    Days(u32),
    /// Opted out of cleanup (any negative value).
    Never,
}

impl Retention {
    /// Resolve the workflow's own value, falling back to `default_days`.
    pub fn resolve(workflow: &str, own: Option<i64>, default_days: i64) -> Result<Self, ScheduleError> {
        let days = own.unwrap_or(default_days);
        if days < 0 {
            return Ok(Retention::Never);
        }
        u32::try_from(days)
            .map(Retention::Days)
            .map_err(|_| ScheduleError::RetentionOutOfRange {
                workflow: workflow.to_string(),
                days,
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn own_value_wins_over_default() {
        assert_eq!(Retention::resolve("w", Some(5), 30).unwrap(), Retention::Days(5));
        assert_eq!(Retention::resolve("w", None, 30).unwrap(), Retention::Days(30));
    }

    #[test]
    fn negative_means_never() {
        assert_eq!(Retention::resolve("w", Some(-1), 30).unwrap(), Retention::Never);
        assert_eq!(Retention::resolve("w", None, -1).unwrap(), Retention::Never);
    }

    #[test]
    fn zero_is_a_real_retention() {
        assert_eq!(Retention::resolve("w", Some(0), -1).unwrap(), Retention::Days(0));
    }

    #[test]
    fn huge_values_are_rejected() {
        let err = Retention::resolve("w", Some(i64::from(u32::MAX) + 1), -1).unwrap_err();
        assert!(matches!(err, ScheduleError::RetentionOutOfRange { days, .. } if days == i64::from(u32::MAX) + 1));
    }
}
