//! External summarization provider.
//!
//! An alternative to the backend's own summarizer: posts the transcript
//! text to a configured bearer-authenticated endpoint and normalizes the
//! response into the shared summary shape.

use serde_json::{json, Value};
use tracing::debug;

use crate::api::{ApiError, SummaryResult};

pub struct ExternalSummarizer {
    http: reqwest::Client,
    endpoint: String,
    api_key: Option<String>,
}

impl ExternalSummarizer {
    pub fn new(endpoint: &str, api_key: Option<&str>) -> Self {
        Self {
            http: reqwest::Client::new(),
            endpoint: endpoint.to_string(),
            api_key: api_key.map(str::to_string),
        }
    }

    pub async fn summarize(
        &self,
        transcript: &str,
        language: Option<&str>,
    ) -> Result<SummaryResult, ApiError> {
        let mut input = json!({
            "task": "summarize",
            "transcript": transcript,
        });
        if let Some(language) = language {
            input["language"] = json!(language);
        }

        debug!("Requesting external summary from {}", self.endpoint);
        let mut request = self.http.post(&self.endpoint).json(&json!({ "input": input }));
        if let Some(key) = &self.api_key {
            request = request.bearer_auth(key);
        }

        let response = request.send().await?;
        if !response.status().is_success() {
            return Err(ApiError::from_response(response).await);
        }

        let body = response.text().await?;
        let value: Value =
            serde_json::from_str(&body).map_err(|e| ApiError::Decode(e.to_string()))?;

        // The provider wraps its result under `output`; fall back to the
        // whole body when it does not.
        let payload = value.get("output").unwrap_or(&value);
        Ok(SummaryResult::from_value(payload))
    }
}
