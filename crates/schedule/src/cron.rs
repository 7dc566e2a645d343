//! Cron normalization and parsing helpers.

use std::str::FromStr;

use cron::Schedule;

/// Normalize a 5-field cron expression to 6-field by prepending "0 " for seconds.
///
/// The `cron` crate requires 6 fields: `sec min hour day-of-month month day-of-week`.
/// Workflow YAML uses standard 5-field cron: `min hour day-of-month month day-of-week`.
/// Runs of whitespace collapse to a single space.
pub fn normalize_cron(expression: &str) -> String {
    let fields: Vec<&str> = expression.split_whitespace().collect();
    if fields.len() == 5 {
        format!("0 {}", fields.join(" "))
    } else {
        // Already 6/7-field or malformed; parsing reports the latter.
        fields.join(" ")
    }
}

/// Parse a (possibly 5-field) cron expression.
pub fn parse_cron(expression: &str) -> Result<Schedule, cron::error::Error> {
    Schedule::from_str(&normalize_cron(expression))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_cron_5_to_6_fields() {
        assert_eq!(normalize_cron("*/15 * * * *"), "0 */15 * * * *");
        assert_eq!(normalize_cron("0 6 * * 1-5"), "0 0 6 * * 1-5");
    }

    #[test]
    fn normalize_cron_already_6_fields() {
        assert_eq!(normalize_cron("0 */15 * * * *"), "0 */15 * * * *");
    }

    #[test]
    fn normalize_cron_collapses_whitespace() {
        assert_eq!(normalize_cron("  */5   * * * *  "), "0 */5 * * * *");
    }

    #[test]
    fn parse_rejects_garbage() {
        assert!(parse_cron("every tuesday").is_err());
        assert!(parse_cron("0 0 * * *").is_ok());
    }
}
