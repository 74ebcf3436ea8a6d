// src/error.rs
//! Upstream failures and the `{error, details}` body returned to callers.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Failure talking to an upstream REST API (CRM or LLM).
#[derive(Debug, thiserror::Error)]
pub enum UpstreamError {
    #[error("upstream request failed: {0}")]
    Transport(#[source] reqwest::Error),
    /// Non-2xx answer; `body` is the upstream payload (JSON, or the raw text as a JSON string).
    #[error("Request failed with status code {status}")]
    Status { status: u16, body: Value },
    #[error("unexpected upstream response: {0}")]
    Decode(String),
}

impl UpstreamError {
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Status { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Upstream payload when there is one, else the failure message.
    pub fn details(&self) -> Value {
        match self {
            Self::Status { body, .. } => body.clone(),
            other => Value::String(other.to_string()),
        }
    }

    /// Build from a non-2xx response, keeping its body verbatim when it is JSON.
    pub(crate) async fn from_response(resp: reqwest::Response) -> Self {
        let status = resp.status().as_u16();
        let body = match resp.text().await {
            Ok(text) => serde_json::from_str(&text).unwrap_or(Value::String(text)),
            Err(e) => Value::String(e.to_string()),
        };
        Self::Status { status, body }
    }
}

impl From<reqwest::Error> for UpstreamError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_decode() {
            Self::Decode(e.to_string())
        } else {
            Self::Transport(e)
        }
    }
}

/// Wire shape of every error response.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ErrorBody {
    pub error: String,
    pub details: Value,
}

/// Error returned by proxy operations and rendered by axum as `{error, details}`.
#[derive(Debug, Clone, PartialEq)]
pub struct ApiError {
    pub status: StatusCode,
    pub summary: String,
    pub details: Value,
}

impl ApiError {
    pub fn new(status: StatusCode, summary: impl Into<String>, details: impl Into<Value>) -> Self {
        Self {
            status,
            summary: summary.into(),
            details: details.into(),
        }
    }

    /// Preserve the upstream status when available, else 500.
    pub fn upstream(summary: impl Into<String>, err: &UpstreamError) -> Self {
        Self::new(status_or_500(err.status()), summary, err.details())
    }

    pub fn body(&self) -> ErrorBody {
        ErrorBody {
            error: self.summary.clone(),
            details: self.details.clone(),
        }
    }
}

pub(crate) fn status_or_500(status: Option<u16>) -> StatusCode {
    status
        .and_then(|s| StatusCode::from_u16(s).ok())
        .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status;
        (status, Json(self.body())).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn status_error_keeps_body_and_status() {
        let err = UpstreamError::Status {
            status: 409,
            body: json!({"message": "Contact already exists"}),
        };
        let api = ApiError::upstream("Failed to create contact", &err);
        assert_eq!(api.status, StatusCode::CONFLICT);
        assert_eq!(api.details, json!({"message": "Contact already exists"}));
    }

    #[test]
    fn decode_error_falls_back_to_500_with_message() {
        let err = UpstreamError::Decode("missing text".into());
        let api = ApiError::upstream("Failed to fetch deals", &err);
        assert_eq!(api.status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(
            api.details,
            json!("unexpected upstream response: missing text")
        );
    }

    #[test]
    fn odd_status_codes_are_preserved() {
        assert_eq!(status_or_500(Some(529)).as_u16(), 529);
        assert_eq!(status_or_500(None), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
