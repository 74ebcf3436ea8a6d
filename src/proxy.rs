// src/proxy.rs
//! Proxy operations: forward to the CRM / LLM, log failures, normalize errors.
//!
//! Every operation re-fetches from upstream; nothing is cached between requests.

use serde_json::{json, Value};
use tracing::{debug, error};

use crate::config::AppConfig;
use crate::crm::CrmClient;
use crate::error::{ApiError, UpstreamError};
use crate::insight::{ContactSummary, DealSummary, Insight, InsightService, LlmClient};

pub struct ProxyService {
    crm: CrmClient,
    insight: InsightService,
}

impl ProxyService {
    pub fn from_config(cfg: &AppConfig) -> anyhow::Result<Self> {
        Ok(Self {
            crm: CrmClient::new(&cfg.crm)?,
            insight: InsightService::new(LlmClient::from_config(&cfg.ai)?),
        })
    }

    pub async fn list_contacts(&self) -> Result<Value, ApiError> {
        self.crm
            .list_contacts()
            .await
            .map_err(|e| fail("list_contacts", "Failed to fetch contacts", e))
    }

    pub async fn create_contact(&self, properties: &Value) -> Result<Value, ApiError> {
        self.crm
            .create_contact(properties)
            .await
            .map_err(|e| fail("create_contact", "Failed to create contact", e))
    }

    pub async fn list_deals(&self) -> Result<Value, ApiError> {
        self.crm
            .list_deals()
            .await
            .map_err(|e| fail("list_deals", "Failed to fetch deals", e))
    }

    /// A missing contact id creates an unassociated deal.
    pub async fn create_deal(
        &self,
        deal_properties: &Value,
        contact_id: Option<&str>,
    ) -> Result<Value, ApiError> {
        self.crm
            .create_deal(deal_properties, contact_id)
            .await
            .map_err(|e| fail("create_deal", "Failed to create deal", e))
    }

    /// Association lookup, then a single batch read of exactly those deals.
    pub async fn list_deals_for_contact(&self, contact_id: &str) -> Result<Value, ApiError> {
        const SUMMARY: &str = "Failed to fetch deals for contact";

        let ids = self
            .crm
            .resolve_deal_ids(contact_id)
            .await
            .map_err(|e| fail("list_deals_for_contact", SUMMARY, e))?;

        match skip_empty_batch(ids) {
            BatchStep::Empty => {
                debug!(contact_id, "no associated deals; batch read skipped");
                Ok(json!({ "results": [] }))
            }
            BatchStep::Read(ids) => self
                .crm
                .batch_read_deals(&ids)
                .await
                .map_err(|e| fail("list_deals_for_contact", SUMMARY, e)),
        }
    }

    pub async fn generate_insight(
        &self,
        contact: &ContactSummary,
        deal: Option<&DealSummary>,
    ) -> Result<Insight, ApiError> {
        self.insight.generate(contact, deal).await
    }
}

/// Outcome of the association step.
#[derive(Debug, PartialEq, Eq)]
pub enum BatchStep {
    /// No associations: answer `{results: []}` without touching the batch endpoint.
    Empty,
    Read(Vec<String>),
}

/// Short-circuit on an empty id list; many batch APIs reject empty inputs.
pub fn skip_empty_batch(ids: Vec<String>) -> BatchStep {
    if ids.is_empty() {
        BatchStep::Empty
    } else {
        BatchStep::Read(ids)
    }
}

fn fail(operation: &'static str, summary: &'static str, e: UpstreamError) -> ApiError {
    error!(
        operation,
        status = ?e.status(),
        details = %e.details(),
        "{summary}"
    );
    ApiError::upstream(summary, &e)
}
