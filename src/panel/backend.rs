// src/panel/backend.rs
//! What the panel controller talks to: the proxy over HTTP, or the proxy in-process.

use std::sync::Arc;

use anyhow::{bail, Context};
use async_trait::async_trait;
use axum::http::StatusCode;
use reqwest::{Client, Url};
use serde::{de::DeserializeOwned, Serialize};
use serde_json::{json, Value};

use crate::crm::{Contact, Deal, ListEnvelope};
use crate::error::ApiError;
use crate::insight::{Insight, InsightRequest};
use crate::proxy::ProxyService;

/// A failed panel → proxy call.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("{reason}")]
pub struct BackendError {
    pub status: Option<u16>,
    /// HTTP reason phrase, or the transport failure text.
    pub reason: String,
    /// The proxy's `error` summary, when it sent one.
    pub error: Option<String>,
    pub details: Option<Value>,
}

impl BackendError {
    pub fn transport(msg: impl Into<String>) -> Self {
        Self {
            status: None,
            reason: msg.into(),
            error: None,
            details: None,
        }
    }

    fn from_status(status: StatusCode, body: Option<Value>) -> Self {
        let error = body
            .as_ref()
            .and_then(|b| b.get("error"))
            .and_then(Value::as_str)
            .map(str::to_string);
        let details = body.as_ref().and_then(|b| b.get("details")).cloned();
        Self {
            status: Some(status.as_u16()),
            reason: status.canonical_reason().unwrap_or("Error").to_string(),
            error,
            details,
        }
    }

    /// `details` as display text (strings unquoted).
    pub fn details_text(&self) -> Option<String> {
        match self.details.as_ref()? {
            Value::Null => None,
            Value::String(s) => Some(s.clone()),
            other => Some(other.to_string()),
        }
    }
}

impl From<ApiError> for BackendError {
    fn from(e: ApiError) -> Self {
        Self::from_status(e.status, Some(json!({ "error": e.summary, "details": e.details })))
    }
}

#[async_trait]
pub trait PanelBackend: Send + Sync {
    async fn list_contacts(&self) -> Result<Vec<Contact>, BackendError>;
    async fn create_contact(&self, properties: &Value) -> Result<Value, BackendError>;
    async fn create_deal(
        &self,
        deal_properties: &Value,
        contact_id: Option<&str>,
    ) -> Result<Value, BackendError>;
    async fn contact_deals(&self, contact_id: &str) -> Result<Vec<Deal>, BackendError>;
    async fn generate_insight(&self, req: &InsightRequest) -> Result<Insight, BackendError>;
}

/// `{results}` of a list payload; a missing list counts as empty.
fn results<T: DeserializeOwned>(raw: Value) -> Result<Vec<T>, BackendError> {
    serde_json::from_value::<ListEnvelope<T>>(raw)
        .map(|env| env.results)
        .map_err(|e| BackendError::transport(format!("invalid response: {e}")))
}

/// Calls the proxy's JSON API over HTTP.
pub struct HttpBackend {
    http: Client,
    base: Url,
}

impl HttpBackend {
    pub fn new(base_url: &str) -> anyhow::Result<Self> {
        let base = Url::parse(base_url.trim_end_matches('/'))
            .with_context(|| format!("invalid proxy url: {base_url}"))?;
        if base.cannot_be_a_base() {
            bail!("proxy url cannot carry a path: {base_url}");
        }
        Ok(Self {
            http: Client::new(),
            base,
        })
    }

    fn url(&self, segments: &[&str]) -> Url {
        let mut url = self.base.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url
    }

    async fn get(&self, segments: &[&str]) -> Result<Value, BackendError> {
        let resp = self.http.get(self.url(segments)).send().await;
        read(resp).await
    }

    async fn post<B: Serialize + ?Sized + Sync>(
        &self,
        segments: &[&str],
        body: &B,
    ) -> Result<Value, BackendError> {
        let resp = self.http.post(self.url(segments)).json(body).send().await;
        read(resp).await
    }
}

async fn read(resp: reqwest::Result<reqwest::Response>) -> Result<Value, BackendError> {
    let resp = resp.map_err(|e| BackendError::transport(e.to_string()))?;
    let status = resp.status();
    if !status.is_success() {
        let body = resp.json::<Value>().await.ok();
        return Err(BackendError::from_status(status, body));
    }
    resp.json::<Value>()
        .await
        .map_err(|e| BackendError::transport(format!("invalid response: {e}")))
}

#[async_trait]
impl PanelBackend for HttpBackend {
    async fn list_contacts(&self) -> Result<Vec<Contact>, BackendError> {
        results(self.get(&["api", "contacts"]).await?)
    }

    async fn create_contact(&self, properties: &Value) -> Result<Value, BackendError> {
        self.post(&["api", "contacts"], &json!({ "properties": properties }))
            .await
    }

    async fn create_deal(
        &self,
        deal_properties: &Value,
        contact_id: Option<&str>,
    ) -> Result<Value, BackendError> {
        let body = json!({ "dealProperties": deal_properties, "contactId": contact_id });
        self.post(&["api", "deals"], &body).await
    }

    async fn contact_deals(&self, contact_id: &str) -> Result<Vec<Deal>, BackendError> {
        results(self.get(&["api", "contacts", contact_id, "deals"]).await?)
    }

    async fn generate_insight(&self, req: &InsightRequest) -> Result<Insight, BackendError> {
        let raw = self.post(&["api", "ai", "insights"], req).await?;
        serde_json::from_value(raw)
            .map_err(|e| BackendError::transport(format!("invalid response: {e}")))
    }
}

/// Calls the proxy operations directly; used by the server-rendered panel.
#[derive(Clone)]
pub struct ServiceBackend {
    proxy: Arc<ProxyService>,
}

impl ServiceBackend {
    pub fn new(proxy: Arc<ProxyService>) -> Self {
        Self { proxy }
    }
}

#[async_trait]
impl PanelBackend for ServiceBackend {
    async fn list_contacts(&self) -> Result<Vec<Contact>, BackendError> {
        results(self.proxy.list_contacts().await?)
    }

    async fn create_contact(&self, properties: &Value) -> Result<Value, BackendError> {
        Ok(self.proxy.create_contact(properties).await?)
    }

    async fn create_deal(
        &self,
        deal_properties: &Value,
        contact_id: Option<&str>,
    ) -> Result<Value, BackendError> {
        Ok(self.proxy.create_deal(deal_properties, contact_id).await?)
    }

    async fn contact_deals(&self, contact_id: &str) -> Result<Vec<Deal>, BackendError> {
        results(self.proxy.list_deals_for_contact(contact_id).await?)
    }

    async fn generate_insight(&self, req: &InsightRequest) -> Result<Insight, BackendError> {
        Ok(self
            .proxy
            .generate_insight(&req.contact_data, req.deal_data.as_ref())
            .await?)
    }
}
