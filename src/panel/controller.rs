// src/panel/controller.rs
//! Panel controller: runs one user action against a [`PanelBackend`] and records the
//! outcome in [`PanelState`]. Rendering stays in `view.rs`.

use chrono::Utc;
use tracing::{debug, warn};

use super::backend::{BackendError, PanelBackend};
use super::state::{
    BannerKind, BannerSlot, ContactForm, DealForm, DealsModal, LoadMode, PanelState, Phase,
    BANNER_TTL, INSIGHT_ERROR_TTL,
};
use super::view::{render, PanelView};
use crate::insight::{ContactSummary, DealSummary, InsightRequest};

pub struct PanelController<B> {
    backend: B,
    state: PanelState,
}

impl<B: PanelBackend> PanelController<B> {
    pub fn new(backend: B) -> Self {
        Self {
            backend,
            state: PanelState::default(),
        }
    }

    pub fn state(&self) -> &PanelState {
        &self.state
    }

    pub fn view(&self) -> PanelView {
        render(&self.state)
    }

    /// Page load: contacts table plus both dropdowns, without the loading indicator.
    pub async fn init(&mut self) {
        self.load_contacts(LoadMode::Silent).await;
    }

    pub async fn load_contacts(&mut self, mode: LoadMode) {
        self.state.contacts.begin(mode);
        let outcome = self
            .backend
            .list_contacts()
            .await
            .map_err(|e| {
                warn!(error = %e, "Error loading contacts");
                format!("Failed to load contacts: {}", e.reason)
            });
        self.state.contacts.finish(outcome);
    }

    /// Returns `true` when the contact was created.
    pub async fn submit_contact(&mut self, form: ContactForm) -> bool {
        self.state.clear_banners(BannerSlot::CreateContact);
        let properties = form.to_properties();
        let res = self.backend.create_contact(&properties).await;

        match res {
            Ok(_) => {
                let msg = format!(
                    "Contact created successfully! {} {} has been added to HubSpot.",
                    form.firstname, form.lastname
                );
                self.banner(BannerSlot::CreateContact, BannerKind::Success, msg, BANNER_TTL);
                self.state.contact_form.draft = ContactForm::default();
                self.load_contacts(LoadMode::Silent).await;
                true
            }
            Err(e) => {
                warn!(error = %e, "Error creating contact");
                let msg = summary_or(&e, "Failed to create contact");
                self.banner(BannerSlot::CreateContact, BannerKind::Error, msg, BANNER_TTL);
                self.state.contact_form.draft = form;
                false
            }
        }
    }

    /// Returns `true` when the deal was created.
    pub async fn submit_deal(&mut self, form: DealForm) -> bool {
        self.state.clear_banners(BannerSlot::CreateDeal);
        let res = self
            .backend
            .create_deal(&form.deal_properties(), form.contact_id())
            .await;

        match res {
            Ok(_) => {
                let msg = format!(
                    "Deal created successfully! {} has been added to HubSpot.",
                    form.dealname
                );
                self.banner(BannerSlot::CreateDeal, BannerKind::Success, msg, BANNER_TTL);
                self.state.deal_form.draft = DealForm::default();
                true
            }
            Err(e) => {
                warn!(error = %e, "Error creating deal");
                let msg = summary_or(&e, "Failed to create deal");
                self.banner(BannerSlot::CreateDeal, BannerKind::Error, msg, BANNER_TTL);
                self.state.deal_form.draft = form;
                false
            }
        }
    }

    /// Opens the modal and fetches fresh; earlier opens are never reused.
    pub async fn view_contact_deals(&mut self, contact_id: &str, contact_name: &str) {
        self.state.deals_modal = Some(DealsModal::open(contact_id, contact_name));
        let outcome = self
            .backend
            .contact_deals(contact_id)
            .await
            .map_err(|e| {
                warn!(error = %e, contact_id, "Error loading deals");
                format!("Failed to load deals: {}", e.reason)
            });
        if let Some(modal) = self.state.deals_modal.as_mut() {
            modal.finish(outcome);
        }
    }

    pub fn close_deals_modal(&mut self) {
        self.state.deals_modal = None;
    }

    /// Insight for the selected contact, enriched with its most recent deal. The
    /// summary comes from the dropdown as-is; the loaded contact list is not consulted.
    pub async fn generate_insights(&mut self, contact: Option<ContactSummary>) {
        let Some((contact, contact_id)) = contact.and_then(|c| {
            let id = c.id.clone().filter(|id| !id.is_empty())?;
            Some((c, id))
        }) else {
            self.banner(
                BannerSlot::Insight,
                BannerKind::Error,
                "Please select a contact".to_string(),
                BANNER_TTL,
            );
            return;
        };

        self.state.insight.phase = Phase::Loading;
        self.state.insight.text = None;
        self.state.insight.generated_at = None;
        self.state.clear_banners(BannerSlot::Insight);

        // Deals are optional context; a failed lookup only means "no deal".
        let deal = match self.backend.contact_deals(&contact_id).await {
            Ok(deals) => deals.first().map(DealSummary::from),
            Err(e) => {
                debug!(error = %e, "No deals found for contact, proceeding with contact data only");
                None
            }
        };

        let req = InsightRequest {
            contact_data: contact,
            deal_data: deal,
        };
        match self.backend.generate_insight(&req).await {
            Ok(insight) => {
                self.state.insight.text = Some(insight.insight);
                self.state.insight.generated_at = Some(insight.timestamp);
                self.state.insight.phase = Phase::Ready;
            }
            Err(e) => {
                warn!(error = %e, "Error generating AI insights");
                let msg = e
                    .error
                    .clone()
                    .or_else(|| e.details_text())
                    .unwrap_or_else(|| "Failed to generate insights".to_string());
                self.state.insight.phase = Phase::Failed(msg.clone());
                self.banner(BannerSlot::Insight, BannerKind::Error, msg, INSIGHT_ERROR_TTL);
            }
        }
    }

    pub fn expire_banners(&mut self, now: chrono::DateTime<Utc>) {
        self.state.expire_banners(now);
    }

    fn banner(&mut self, slot: BannerSlot, kind: BannerKind, msg: String, ttl: std::time::Duration) {
        self.state.show_banner(slot, kind, msg, ttl, Utc::now());
    }
}

fn summary_or(e: &BackendError, fallback: &str) -> String {
    e.error
        .clone()
        .unwrap_or_else(|| format!("{fallback}: {}", e.reason))
}
