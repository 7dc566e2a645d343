//! Model-serving client (TensorFlow-Serving style `:predict` endpoint).

use serde_json::{json, Value};
use tracing::debug;

use director_core::config::ModelConfig;

use super::PredictError;

pub struct ModelClient {
    client: reqwest::Client,
    url: String,
}

impl ModelClient {
    pub fn from_config(config: &ModelConfig) -> Result<Self, PredictError> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout())
            .build()
            .map_err(|e| PredictError::Model(e.to_string()))?;
        Ok(Self {
            client,
            url: config.url.clone(),
        })
    }

    /// Score one series of weekly event counts.
    pub async fn score(&self, counts: &[u64]) -> Result<f64, PredictError> {
        debug!("model request to {}", self.url);

        let response = self
            .client
            .post(&self.url)
            .json(&json!({ "instances": [counts] }))
            .send()
            .await
            .map_err(|e| PredictError::Model(e.to_string()))?;

        let status = response.status().as_u16();
        if status != 200 {
            let body = response.text().await.unwrap_or_default();
            return Err(PredictError::ModelStatus { status, body });
        }

        let resp: Value = response
            .json()
            .await
            .map_err(|e| PredictError::Parse(e.to_string()))?;
        parse_score(&resp)
    }
}

/// Read `predictions[0]`, accepting either a scalar or a one-element vector.
pub(crate) fn parse_score(resp: &Value) -> Result<f64, PredictError> {
    let first = &resp["predictions"][0];
    first
        .as_f64()
        .or_else(|| first[0].as_f64())
        .ok_or_else(|| PredictError::Parse("missing predictions[0]".into()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scalar_prediction() {
        assert_eq!(parse_score(&json!({ "predictions": [0.75] })).unwrap(), 0.75);
    }

    #[test]
    fn nested_prediction() {
        assert_eq!(parse_score(&json!({ "predictions": [[0.25]] })).unwrap(), 0.25);
    }

    #[test]
    fn empty_predictions_fail() {
        assert!(matches!(
            parse_score(&json!({ "predictions": [] })).unwrap_err(),
            PredictError::Parse(_)
        ));
    }
}
