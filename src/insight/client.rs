// src/insight/client.rs
//! Anthropic Messages API client. One call per insight, bounded by `max_tokens`.

use std::time::Instant;

use anyhow::Context;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::config::AiConfig;
use crate::error::UpstreamError;
use crate::metrics::{observe_upstream, Upstream};

pub struct LlmClient {
    http: Client,
    api_key: String,
    endpoint: String,
    model: String,
    max_tokens: u32,
    api_version: String,
}

#[derive(Serialize)]
struct Msg<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Serialize)]
struct Req<'a> {
    model: &'a str,
    max_tokens: u32,
    messages: Vec<Msg<'a>>,
}

#[derive(Deserialize)]
struct Resp {
    #[serde(default)]
    content: Vec<Block>,
}

#[derive(Deserialize)]
struct Block {
    #[serde(default)]
    text: Option<String>,
}

impl LlmClient {
    /// Returns `None` when no API key is configured.
    pub fn from_config(cfg: &AiConfig) -> anyhow::Result<Option<Self>> {
        let Some(api_key) = cfg.api_key.clone() else {
            return Ok(None);
        };
        let http = Client::builder()
            .user_agent(concat!("crm-panel-proxy/", env!("CARGO_PKG_VERSION")))
            .build()
            .context("building LLM http client")?;
        Ok(Some(Self {
            http,
            api_key,
            endpoint: format!("{}/v1/messages", cfg.base_url),
            model: cfg.model.clone(),
            max_tokens: cfg.max_tokens,
            api_version: cfg.api_version.clone(),
        }))
    }

    /// Text of the first content block.
    pub async fn complete(&self, prompt: &str) -> Result<String, UpstreamError> {
        let started = Instant::now();
        let res = self.complete_inner(prompt).await;
        observe_upstream(Upstream::Llm, "messages", res.is_ok(), started.elapsed());
        res
    }

    async fn complete_inner(&self, prompt: &str) -> Result<String, UpstreamError> {
        let req = Req {
            model: &self.model,
            max_tokens: self.max_tokens,
            messages: vec![Msg {
                role: "user",
                content: prompt,
            }],
        };

        let resp = self
            .http
            .post(&self.endpoint)
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", &self.api_version)
            .json(&req)
            .send()
            .await?;

        if !resp.status().is_success() {
            return Err(UpstreamError::from_response(resp).await);
        }

        let body: Resp = resp.json().await?;
        body.content
            .into_iter()
            .next()
            .and_then(|b| b.text)
            .ok_or_else(|| UpstreamError::Decode("response has no text content".to_string()))
    }
}

/// Provider error categories that get their own user-facing message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LlmErrorKind {
    Overloaded,
    RateLimited,
    AuthFailed,
    Other,
}

impl LlmErrorKind {
    pub fn from_type(error_type: Option<&str>) -> Self {
        match error_type {
            Some("overloaded_error") => Self::Overloaded,
            Some("rate_limit_error") => Self::RateLimited,
            Some("authentication_error") => Self::AuthFailed,
            _ => Self::Other,
        }
    }

    pub fn user_message(self) -> &'static str {
        match self {
            Self::Overloaded => "Anthropic Claude API servers are experiencing high traffic. Please try again in 30-60 seconds.",
            Self::RateLimited => "API rate limit reached. Please wait a moment before trying again.",
            Self::AuthFailed => "AI API authentication failed. Please check your API key configuration.",
            Self::Other => "Failed to generate AI insights",
        }
    }
}

/// Classify a failed call and pick the detail string: provider `error.message`, else the failure text.
pub fn classify(err: &UpstreamError) -> (LlmErrorKind, Value) {
    let provider_error = match err {
        UpstreamError::Status { body, .. } => body.get("error"),
        _ => None,
    };
    let kind = LlmErrorKind::from_type(
        provider_error
            .and_then(|e| e.get("type"))
            .and_then(Value::as_str),
    );
    let details = provider_error
        .and_then(|e| e.get("message"))
        .filter(|m| !m.is_null())
        .cloned()
        .unwrap_or_else(|| Value::String(err.to_string()));
    (kind, details)
}
