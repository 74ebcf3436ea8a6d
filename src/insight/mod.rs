// src/insight/mod.rs
//! Contact insights: fixed prompt + one language-model call, never stored.

pub mod client;
pub mod prompt;

use axum::http::StatusCode;
use chrono::{SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use tracing::error;

pub use client::{classify, LlmClient, LlmErrorKind};
pub use prompt::{build_prompt, ContactSummary, DealSummary, InsightRequest};

use crate::config::ai::ENV_API_KEY;
use crate::error::{status_or_500, ApiError};

pub const NOT_CONFIGURED: &str = "AI feature not configured";

/// Generated text plus the time it was produced.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Insight {
    pub insight: String,
    pub timestamp: String,
}

pub struct InsightService {
    client: Option<LlmClient>,
}

impl InsightService {
    pub fn new(client: Option<LlmClient>) -> Self {
        Self { client }
    }

    pub async fn generate(
        &self,
        contact: &ContactSummary,
        deal: Option<&DealSummary>,
    ) -> Result<Insight, ApiError> {
        // Fail before any upstream call when the key is absent.
        let Some(client) = &self.client else {
            return Err(ApiError::new(
                StatusCode::BAD_REQUEST,
                NOT_CONFIGURED,
                format!("{ENV_API_KEY} not found in environment variables"),
            ));
        };

        let prompt = build_prompt(contact, deal);
        match client.complete(&prompt).await {
            Ok(text) => Ok(Insight {
                insight: text,
                timestamp: now_iso(),
            }),
            Err(e) => {
                error!(
                    operation = "generate_insight",
                    status = ?e.status(),
                    details = %e.details(),
                    "Error generating AI insights"
                );
                let (kind, details) = classify(&e);
                Err(ApiError::new(
                    status_or_500(e.status()),
                    kind.user_message(),
                    details,
                ))
            }
        }
    }
}

pub(crate) fn now_iso() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
}
