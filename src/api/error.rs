//! Error taxonomy for backend calls.
//!
//! Errors are caught at the call site and converted to user-facing messages;
//! they never propagate uncaught into output rendering. A 404 from the list
//! endpoint is a valid empty collection — callers check `is_not_found` and
//! treat it as such instead of escalating.

use serde_json::Value;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ApiError {
    /// The request never produced an HTTP response.
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),
    /// Non-2xx response, carrying the server's `detail` message when the
    /// body was parseable JSON.
    #[error("server returned status {status}")]
    Http { status: u16, detail: Option<String> },
    /// 2xx response whose body did not match the expected shape.
    #[error("unexpected response body: {0}")]
    Decode(String),
}

impl ApiError {
    /// Human-readable message for display next to the triggering control.
    /// Prefers the server-provided detail, degrades to a generic message.
    pub fn user_message(&self) -> String {
        match self {
            ApiError::Http {
                detail: Some(detail),
                ..
            } => detail.clone(),
            ApiError::Http { status, .. } => format!("Request failed with status {status}"),
            ApiError::Network(_) => "Network error. Please try again.".to_string(),
            ApiError::Decode(_) => "Unexpected response from server.".to_string(),
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, ApiError::Http { status: 404, .. })
    }

    /// Build an `Http` error from a non-2xx response, extracting the JSON
    /// `detail` field when present.
    pub(crate) async fn from_response(response: reqwest::Response) -> ApiError {
        let status = response.status().as_u16();
        let body = response.text().await.unwrap_or_default();
        let detail = serde_json::from_str::<Value>(&body)
            .ok()
            .and_then(|v| v.get("detail").and_then(Value::as_str).map(str::to_string));
        ApiError::Http { status, detail }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_detail_is_surfaced_verbatim() {
        let err = ApiError::Http {
            status: 413,
            detail: Some("too large".to_string()),
        };
        assert_eq!(err.user_message(), "too large");
    }

    #[test]
    fn test_missing_detail_degrades_to_generic() {
        let err = ApiError::Http {
            status: 500,
            detail: None,
        };
        assert_eq!(err.user_message(), "Request failed with status 500");
    }

    #[test]
    fn test_not_found_detection() {
        let err = ApiError::Http {
            status: 404,
            detail: None,
        };
        assert!(err.is_not_found());

        let err = ApiError::Http {
            status: 403,
            detail: None,
        };
        assert!(!err.is_not_found());
    }
}
