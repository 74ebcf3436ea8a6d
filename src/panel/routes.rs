// src/panel/routes.rs
//! Server-rendered panel. Each request builds a fresh controller over the in-process
//! backend, runs one action and renders the whole page.

use axum::{
    extract::{Query, State},
    response::Html,
    routing::{get, post},
    Form, Router,
};
use serde::Deserialize;

use super::backend::ServiceBackend;
use super::controller::PanelController;
use super::html::to_html;
use super::state::{ContactForm, DealForm};
use super::view::{contact_name, selected_contact};
use crate::api::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(page))
        .route("/panel/contacts", post(create_contact))
        .route("/panel/deals", post(create_deal))
        .route("/panel/insights", post(generate_insights))
}

type Controller = PanelController<ServiceBackend>;

async fn loaded(state: &AppState) -> Controller {
    let mut ctl = PanelController::new(ServiceBackend::new(state.proxy.clone()));
    ctl.init().await;
    ctl
}

fn html(ctl: &Controller) -> Html<String> {
    Html(to_html(&ctl.view()))
}

#[derive(Debug, Default, Deserialize)]
struct PageQuery {
    deals_for: Option<String>,
}

async fn page(State(state): State<AppState>, Query(q): Query<PageQuery>) -> Html<String> {
    let mut ctl = loaded(&state).await;
    if let Some(contact_id) = q.deals_for.filter(|id| !id.is_empty()) {
        let name = ctl
            .state()
            .contacts
            .find(&contact_id)
            .map(contact_name)
            .unwrap_or_default();
        ctl.view_contact_deals(&contact_id, &name).await;
    }
    html(&ctl)
}

async fn create_contact(State(state): State<AppState>, Form(form): Form<ContactForm>) -> Html<String> {
    let mut ctl = PanelController::new(ServiceBackend::new(state.proxy.clone()));
    // A successful create reloads contacts itself (silently).
    if !ctl.submit_contact(form).await {
        ctl.init().await;
    }
    html(&ctl)
}

async fn create_deal(State(state): State<AppState>, Form(form): Form<DealForm>) -> Html<String> {
    let mut ctl = loaded(&state).await;
    ctl.submit_deal(form).await;
    html(&ctl)
}

#[derive(Debug, Default, Deserialize)]
struct InsightForm {
    #[serde(default, rename = "ai-contact")]
    contact: String,
}

/// Generates from the posted summary; the contact reload only repaints the page, and
/// a failure there is reported on the contacts table.
async fn generate_insights(
    State(state): State<AppState>,
    Form(form): Form<InsightForm>,
) -> Html<String> {
    let mut ctl = loaded(&state).await;
    ctl.generate_insights(selected_contact(&form.contact)).await;
    html(&ctl)
}
