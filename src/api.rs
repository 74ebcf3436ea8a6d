use std::sync::Arc;

use axum::{
    extract::{Path, State},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tower_http::cors::CorsLayer;
use tracing::warn;

use crate::config::AppConfig;
use crate::crm::types::opt_text;
use crate::error::ApiError;
use crate::insight::{now_iso, Insight, InsightRequest};
use crate::metrics::Metrics;
use crate::panel;
use crate::proxy::ProxyService;

/// Shared, read-only state: configuration was consumed at construction time.
#[derive(Clone)]
pub struct AppState {
    pub proxy: Arc<ProxyService>,
    metrics: Option<Arc<Metrics>>,
}

impl AppState {
    pub fn from_config(cfg: &AppConfig) -> anyhow::Result<Self> {
        let metrics = if cfg.metrics_enabled {
            Some(Arc::new(Metrics::init()?))
        } else {
            None
        };
        if cfg.ai.api_key.is_none() {
            warn!("ANTHROPIC_API_KEY not set; /api/ai/insights will answer 'AI feature not configured'");
        }
        Ok(Self {
            proxy: Arc::new(ProxyService::from_config(cfg)?),
            metrics,
        })
    }
}

/// Build the full application router (JSON API + server-rendered panel).
pub fn router(state: AppState) -> Router {
    let mut app = Router::new()
        .route("/health", get(health))
        .route("/api/contacts", get(list_contacts).post(create_contact))
        .route("/api/deals", get(list_deals).post(create_deal))
        .route("/api/contacts/{contact_id}/deals", get(contact_deals))
        .route("/api/ai/insights", post(generate_insight))
        .merge(panel::routes::router());

    if let Some(m) = &state.metrics {
        app = app.merge(m.router());
    }

    app.layer(CorsLayer::very_permissive()).with_state(state)
}

#[derive(Serialize)]
struct HealthResp {
    status: &'static str,
    timestamp: String,
}

async fn health() -> Json<HealthResp> {
    Json(HealthResp {
        status: "Server is running",
        timestamp: now_iso(),
    })
}

async fn list_contacts(State(state): State<AppState>) -> Result<Json<Value>, ApiError> {
    state.proxy.list_contacts().await.map(Json)
}

#[derive(Deserialize)]
struct CreateContactReq {
    #[serde(default)]
    properties: Value,
}

async fn create_contact(
    State(state): State<AppState>,
    Json(body): Json<CreateContactReq>,
) -> Result<Json<Value>, ApiError> {
    state.proxy.create_contact(&body.properties).await.map(Json)
}

async fn list_deals(State(state): State<AppState>) -> Result<Json<Value>, ApiError> {
    state.proxy.list_deals().await.map(Json)
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct CreateDealReq {
    #[serde(default)]
    deal_properties: Value,
    #[serde(default, deserialize_with = "opt_text")]
    contact_id: Option<String>,
}

async fn create_deal(
    State(state): State<AppState>,
    Json(body): Json<CreateDealReq>,
) -> Result<Json<Value>, ApiError> {
    state
        .proxy
        .create_deal(&body.deal_properties, body.contact_id.as_deref())
        .await
        .map(Json)
}

async fn contact_deals(
    State(state): State<AppState>,
    Path(contact_id): Path<String>,
) -> Result<Json<Value>, ApiError> {
    state.proxy.list_deals_for_contact(&contact_id).await.map(Json)
}

async fn generate_insight(
    State(state): State<AppState>,
    Json(body): Json<InsightRequest>,
) -> Result<Json<Insight>, ApiError> {
    state
        .proxy
        .generate_insight(&body.contact_data, body.deal_data.as_ref())
        .await
        .map(Json)
}
