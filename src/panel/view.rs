// src/panel/view.rs
//! Pure `PanelState → PanelView` rendering. No I/O, no escaping: the view holds raw
//! strings and `html.rs` escapes them on the way out.

use std::time::Duration;

use super::markup::{parse_insight, Block};
use super::state::{BannerKind, BannerSlot, ContactForm, DealForm, PanelState};
use crate::crm::{Contact, Deal};
use crate::insight::ContactSummary;

pub const NO_CONTACTS: &str = "No contacts found";
pub const NO_DEALS: &str = "No subscriptions found";

#[derive(Debug, Clone, PartialEq)]
pub struct PanelView {
    pub contacts: ContactsTableView,
    pub contact_form: ContactForm,
    pub deal_form: DealFormView,
    pub insight: InsightView,
    pub deals_modal: Option<DealsModalView>,
    pub banners: Vec<BannerView>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ContactsTableView {
    pub loading: bool,
    pub visible: bool,
    pub error: Option<String>,
    pub rows: Vec<ContactRow>,
    pub empty_message: Option<&'static str>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContactRow {
    pub contact_id: String,
    pub firstname: String,
    pub lastname: String,
    pub email: String,
    pub jobtitle: String,
    pub company: String,
    /// "first last", carried by the View Deals action.
    pub display_name: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ContactOption {
    pub value: String,
    pub label: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DealFormView {
    pub values: DealForm,
    pub contact_options: Vec<ContactOption>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct InsightView {
    pub loading: bool,
    pub contact_options: Vec<ContactOption>,
    pub blocks: Option<Vec<Block>>,
    pub generated_at: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DealsModalView {
    pub contact_id: String,
    pub contact_name: String,
    pub loading: bool,
    pub error: Option<String>,
    pub cards: Vec<DealCard>,
    pub empty_message: Option<&'static str>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DealCard {
    pub name: String,
    pub amount: String,
    pub stage: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct BannerView {
    pub slot: BannerSlot,
    pub kind: BannerKind,
    pub message: String,
    pub auto_hide: Duration,
}

pub fn render(state: &PanelState) -> PanelView {
    let contacts = &state.contacts.contacts;

    PanelView {
        contacts: ContactsTableView {
            loading: state.contacts.phase.is_loading(),
            visible: state.contacts.table_visible,
            error: state.contacts.phase.error().map(str::to_string),
            rows: contacts.iter().map(contact_row).collect(),
            empty_message: contacts.is_empty().then_some(NO_CONTACTS),
        },
        contact_form: state.contact_form.draft.clone(),
        deal_form: DealFormView {
            values: state.deal_form.draft.clone(),
            contact_options: contacts.iter().map(deal_option).collect(),
        },
        insight: InsightView {
            loading: state.insight.phase.is_loading(),
            contact_options: contacts.iter().map(insight_option).collect(),
            blocks: state.insight.text.as_deref().map(parse_insight),
            generated_at: state.insight.generated_at.clone(),
        },
        deals_modal: state.deals_modal.as_ref().map(|m| DealsModalView {
            contact_id: m.contact_id.clone(),
            contact_name: m.contact_name.clone(),
            loading: m.phase.is_loading(),
            error: m.phase.error().map(str::to_string),
            cards: m.deals.iter().map(deal_card).collect(),
            empty_message: (m.phase == super::state::Phase::Ready && m.deals.is_empty())
                .then_some(NO_DEALS),
        }),
        banners: state
            .banners
            .iter()
            .map(|b| BannerView {
                slot: b.slot,
                kind: b.kind,
                message: b.message.clone(),
                auto_hide: b.ttl,
            })
            .collect(),
    }
}

fn or_empty(v: &Option<String>) -> String {
    v.clone().unwrap_or_default()
}

fn contact_row(c: &Contact) -> ContactRow {
    let p = &c.properties;
    let firstname = or_empty(&p.firstname);
    let lastname = or_empty(&p.lastname);
    ContactRow {
        contact_id: c.id.clone(),
        display_name: format!("{firstname} {lastname}"),
        firstname,
        lastname,
        email: or_empty(&p.email),
        jobtitle: or_empty(&p.jobtitle),
        company: or_empty(&p.company),
    }
}

/// "First Last", as shown in the deals modal title.
pub fn contact_name(c: &Contact) -> String {
    let p = &c.properties;
    format!("{} {}", or_empty(&p.firstname), or_empty(&p.lastname))
}

pub fn contact_label(c: &Contact) -> String {
    let p = &c.properties;
    format!(
        "{} {} ({})",
        or_empty(&p.firstname),
        or_empty(&p.lastname),
        or_empty(&p.email)
    )
}

fn deal_option(c: &Contact) -> ContactOption {
    ContactOption {
        value: c.id.clone(),
        label: contact_label(c),
    }
}

/// The insight dropdown carries the whole contact summary as JSON, so generating
/// needs no second contact fetch.
fn insight_option(c: &Contact) -> ContactOption {
    let value = serde_json::to_string(&ContactSummary::from(c)).unwrap_or_else(|_| c.id.clone());
    ContactOption {
        value,
        label: contact_label(c),
    }
}

/// Decodes a posted insight selection. Anything without a contact id is no selection.
pub fn selected_contact(value: &str) -> Option<ContactSummary> {
    serde_json::from_str::<ContactSummary>(value)
        .ok()
        .filter(|c| c.id.as_deref().is_some_and(|id| !id.is_empty()))
}

fn deal_card(d: &Deal) -> DealCard {
    let p = &d.properties;
    let pick = |v: &Option<String>, fallback: &str| {
        v.as_deref()
            .filter(|s| !s.is_empty())
            .unwrap_or(fallback)
            .to_string()
    };
    DealCard {
        name: pick(&p.dealname, "Unnamed Deal"),
        amount: pick(&p.amount, "0"),
        stage: pick(&p.dealstage, "Unknown"),
    }
}
