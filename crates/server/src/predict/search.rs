//! OpenSearch client for weekly repository activity.

use std::time::{Duration, SystemTime, UNIX_EPOCH};

use serde_json::{json, Value};
use tracing::{debug, warn};

use director_core::config::OpenSearchConfig;

use super::{PredictError, WeeklyActivity};

/// Field holding the event timestamp in enriched GrimoireLab indices.
const DATE_FIELD: &str = "grimoire_creation_date";
/// Field holding the repository URL.
const ORIGIN_FIELD: &str = "origin";

pub struct SearchIndexClient {
    client: reqwest::Client,
    base_url: String,
    index: String,
    username: Option<String>,
    password: Option<String>,
    max_retries: u32,
}

impl SearchIndexClient {
    pub fn from_config(config: &OpenSearchConfig, timeout: Duration) -> Result<Self, PredictError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| PredictError::Search(e.to_string()))?;
        Ok(Self {
            client,
            base_url: config.base_url(),
            index: config.index.clone(),
            username: config.username.clone(),
            password: config.password.clone(),
            max_retries: config.max_retries,
        })
    }

    /// Weekly event counts for `origin` over the last `weeks` weeks, oldest first.
    ///
    /// Transport errors, 429 and 5xx responses are retried with exponential
    /// backoff; other statuses fail immediately.
    pub async fn weekly_activity(&self, origin: &str, weeks: usize) -> Result<Vec<WeeklyActivity>, PredictError> {
        let url = format!("{}/{}/_search", self.base_url, self.index);
        let body = activity_query(origin, weeks);

        let initial_delay_ms: u64 = 200;
        let max_delay_ms: u64 = 2000;
        let backoff_factor: f64 = 1.5;
        let mut delay_ms = initial_delay_ms;
        let mut attempt: u32 = 0;

        loop {
            attempt += 1;
            let mut request = self.client.post(&url).json(&body);
            if let Some(user) = &self.username {
                request = request.basic_auth(user, self.password.as_deref());
            }

            let err = match request.send().await {
                Ok(response) => {
                    let status = response.status();
                    if status.is_success() {
                        let resp: Value = response
                            .json()
                            .await
                            .map_err(|e| PredictError::Parse(e.to_string()))?;
                        return parse_histogram(&resp);
                    }
                    let body = response.text().await.unwrap_or_default();
                    let err = PredictError::SearchStatus {
                        status: status.as_u16(),
                        body,
                    };
                    if !(status.is_server_error() || status.as_u16() == 429) {
                        return Err(err);
                    }
                    err
                }
                Err(e) => PredictError::Search(e.to_string()),
            };

            if attempt > self.max_retries {
                warn!(origin = %origin, attempts = attempt, error = %err, "search index retries exhausted");
                return Err(err);
            }

            // Jitter without rand: nanosecond fraction of current time.
            let jitter_ms = SystemTime::now()
                .duration_since(UNIX_EPOCH)
                .unwrap_or_default()
                .subsec_nanos()
                % 100;
            debug!(origin = %origin, attempt, delay_ms, error = %err, "retrying search index query");
            tokio::time::sleep(Duration::from_millis(delay_ms + jitter_ms as u64)).await;

            delay_ms = ((delay_ms as f64 * backoff_factor) as u64).min(max_delay_ms);
        }
    }
}

/// Date-histogram query of one repository's events.
pub(crate) fn activity_query(origin: &str, weeks: usize) -> Value {
    json!({
        "size": 0,
        "query": {
            "bool": {
                "filter": [
                    { "term": { ORIGIN_FIELD: origin } },
                    { "range": { DATE_FIELD: { "gte": format!("now-{}w/w", weeks) } } }
                ]
            }
        },
        "aggs": {
            "weekly": {
                "date_histogram": {
                    "field": DATE_FIELD,
                    "calendar_interval": "week",
                    "min_doc_count": 0
                }
            }
        }
    })
}

/// Extract `aggregations.weekly.buckets` from a search response.
pub(crate) fn parse_histogram(resp: &Value) -> Result<Vec<WeeklyActivity>, PredictError> {
    let buckets = resp["aggregations"]["weekly"]["buckets"]
        .as_array()
        .ok_or_else(|| PredictError::Parse("missing aggregations.weekly.buckets".into()))?;

    buckets
        .iter()
        .map(|b| {
            let week_start = b["key_as_string"]
                .as_str()
                .map(str::to_string)
                .or_else(|| b["key"].as_i64().map(|k| k.to_string()))
                .ok_or_else(|| PredictError::Parse("bucket without key".into()))?;
            let events = b["doc_count"]
                .as_u64()
                .ok_or_else(|| PredictError::Parse("bucket without doc_count".into()))?;
            Ok(WeeklyActivity { week_start, events })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn query_filters_origin_and_window() {
        let q = activity_query("https://github.com/org/repo", 12);
        let filters = q["query"]["bool"]["filter"].as_array().unwrap();
        assert_eq!(filters[0]["term"]["origin"], "https://github.com/org/repo");
        assert_eq!(filters[1]["range"]["grimoire_creation_date"]["gte"], "now-12w/w");
        assert_eq!(q["aggs"]["weekly"]["date_histogram"]["calendar_interval"], "week");
        assert_eq!(q["size"], 0);
    }

    #[test]
    fn parses_buckets_in_order() {
        let resp = json!({
            "aggregations": { "weekly": { "buckets": [
                { "key_as_string": "2024-01-01T00:00:00.000Z", "key": 1704067200000i64, "doc_count": 4 },
                { "key": 1704672000000i64, "doc_count": 0 }
            ]}}
        });
        let weeks = parse_histogram(&resp).unwrap();
        assert_eq!(weeks.len(), 2);
        assert_eq!(weeks[0].week_start, "2024-01-01T00:00:00.000Z");
        assert_eq!(weeks[0].events, 4);
        assert_eq!(weeks[1].week_start, "1704672000000");
        assert_eq!(weeks[1].events, 0);
    }

    #[test]
    fn missing_aggregation_is_parse_error() {
        let err = parse_histogram(&json!({ "hits": {} })).unwrap_err();
        assert!(matches!(err, PredictError::Parse(_)));
    }
}
