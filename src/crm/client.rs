// src/crm/client.rs
//! HubSpot CRM v3 client: bearer auth, fixed projections, verbatim JSON payloads.

use std::time::Instant;

use anyhow::{bail, Context};
use reqwest::{Client, RequestBuilder, Url};
use serde_json::Value;

use super::types::{
    AssociationEdge, AssociationRef, AssociationType, BatchReadPayload, CreateDealPayload,
    ListEnvelope, ObjectRef, CONTACT_PROPERTIES, DEAL_PROPERTIES, PAGE_LIMIT,
};
use crate::config::{AssociationSpec, CrmConfig};
use crate::error::UpstreamError;
use crate::metrics::{observe_upstream, Upstream};

#[derive(Clone)]
pub struct CrmClient {
    http: Client,
    base: Url,
    token: String,
    association: AssociationSpec,
}

impl CrmClient {
    pub fn new(cfg: &CrmConfig) -> anyhow::Result<Self> {
        let base = Url::parse(&cfg.base_url)
            .with_context(|| format!("invalid CRM base url: {}", cfg.base_url))?;
        if base.cannot_be_a_base() {
            bail!("CRM base url cannot carry a path: {}", cfg.base_url);
        }
        let http = Client::builder()
            .user_agent(concat!("crm-panel-proxy/", env!("CARGO_PKG_VERSION")))
            .build()
            .context("building CRM http client")?;
        Ok(Self {
            http,
            base,
            token: cfg.token.clone(),
            association: cfg.deal_contact_association.clone(),
        })
    }

    /// First page of contacts with the contact projection.
    pub async fn list_contacts(&self) -> Result<Value, UpstreamError> {
        let req = self
            .http
            .get(self.endpoint(&["crm", "v3", "objects", "contacts"]))
            .query(&[
                ("limit", PAGE_LIMIT.to_string()),
                ("properties", CONTACT_PROPERTIES.join(",")),
            ]);
        self.send("list_contacts", req).await
    }

    /// No local validation; the CRM decides what a valid contact is.
    pub async fn create_contact(&self, properties: &Value) -> Result<Value, UpstreamError> {
        let body = serde_json::json!({ "properties": properties });
        let req = self
            .http
            .post(self.endpoint(&["crm", "v3", "objects", "contacts"]))
            .json(&body);
        self.send("create_contact", req).await
    }

    /// First page of deals with the deal projection.
    pub async fn list_deals(&self) -> Result<Value, UpstreamError> {
        let req = self
            .http
            .get(self.endpoint(&["crm", "v3", "objects", "deals"]))
            .query(&[
                ("limit", PAGE_LIMIT.to_string()),
                ("properties", DEAL_PROPERTIES.join(",")),
            ]);
        self.send("list_deals", req).await
    }

    pub async fn create_deal(
        &self,
        properties: &Value,
        contact_id: Option<&str>,
    ) -> Result<Value, UpstreamError> {
        let payload = self.deal_payload(properties, contact_id);
        let req = self
            .http
            .post(self.endpoint(&["crm", "v3", "objects", "deals"]))
            .json(&payload);
        self.send("create_deal", req).await
    }

    /// Create payload with one association edge per present, non-empty contact id (so 0 or 1).
    pub fn deal_payload(&self, properties: &Value, contact_id: Option<&str>) -> CreateDealPayload {
        let associations = contact_id
            .filter(|id| !id.is_empty())
            .map(|id| AssociationEdge {
                to: ObjectRef { id: id.to_string() },
                types: vec![AssociationType {
                    association_category: self.association.category.clone(),
                    association_type_id: self.association.type_id,
                }],
            })
            .into_iter()
            .collect();
        CreateDealPayload {
            properties: properties.clone(),
            associations,
        }
    }

    /// Deal ids associated with a contact, in upstream order.
    pub async fn resolve_deal_ids(&self, contact_id: &str) -> Result<Vec<String>, UpstreamError> {
        let req = self.http.get(self.endpoint(&[
            "crm",
            "v3",
            "objects",
            "contacts",
            contact_id,
            "associations",
            "deals",
        ]));
        let raw = self.send("contact_deal_associations", req).await?;
        let env: ListEnvelope<AssociationRef> = serde_json::from_value(raw)
            .map_err(|e| UpstreamError::Decode(format!("association list: {e}")))?;
        Ok(env.results.into_iter().map(|r| r.id).collect())
    }

    /// One batch-read call for all `ids`. Callers must not pass an empty slice.
    pub async fn batch_read_deals(&self, ids: &[String]) -> Result<Value, UpstreamError> {
        let payload = BatchReadPayload {
            inputs: ids.iter().map(|id| ObjectRef { id: id.clone() }).collect(),
            properties: &DEAL_PROPERTIES,
        };
        let req = self
            .http
            .post(self.endpoint(&["crm", "v3", "objects", "deals", "batch", "read"]))
            .json(&payload);
        self.send("batch_read_deals", req).await
    }

    fn endpoint(&self, segments: &[&str]) -> Url {
        let mut url = self.base.clone();
        // `new` rejected cannot-be-a-base urls, so this always succeeds.
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url
    }

    async fn send(&self, operation: &'static str, req: RequestBuilder) -> Result<Value, UpstreamError> {
        let started = Instant::now();
        let res = self.send_inner(req).await;
        observe_upstream(Upstream::Crm, operation, res.is_ok(), started.elapsed());
        res
    }

    async fn send_inner(&self, req: RequestBuilder) -> Result<Value, UpstreamError> {
        let resp = req.bearer_auth(&self.token).send().await?;
        if !resp.status().is_success() {
            return Err(UpstreamError::from_response(resp).await);
        }
        Ok(resp.json::<Value>().await?)
    }
}
