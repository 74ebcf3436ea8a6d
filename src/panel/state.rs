// src/panel/state.rs
//! Panel state. Each view moves `Idle → Loading → {Ready | Failed}` on its own and is
//! reset at the start of every fetch.

use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde_json::{Map, Value};

use crate::crm::types::CLOSED_WON_STAGE;
use crate::crm::{Contact, Deal};

/// Create-flow banners.
pub const BANNER_TTL: Duration = Duration::from_secs(5);
/// Insight errors stay longer; overload messages need reading time.
pub const INSIGHT_ERROR_TTL: Duration = Duration::from_secs(10);

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum Phase {
    #[default]
    Idle,
    Loading,
    Ready,
    Failed(String),
}

impl Phase {
    pub fn is_loading(&self) -> bool {
        matches!(self, Phase::Loading)
    }

    pub fn error(&self) -> Option<&str> {
        match self {
            Phase::Failed(msg) => Some(msg),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadMode {
    /// Loading indicator shown, previous table hidden until the fetch ends.
    Normal,
    /// Used after a successful create: table stays up, errors still surface.
    Silent,
}

#[derive(Debug, Clone, Default)]
pub struct ContactsState {
    pub phase: Phase,
    pub contacts: Vec<Contact>,
    pub table_visible: bool,
}

impl ContactsState {
    pub fn begin(&mut self, mode: LoadMode) {
        if mode == LoadMode::Normal {
            self.phase = Phase::Loading;
            self.table_visible = false;
        } else if self.phase.error().is_some() {
            self.phase = Phase::Idle;
        }
    }

    pub fn finish(&mut self, outcome: Result<Vec<Contact>, String>) {
        match outcome {
            Ok(contacts) => {
                self.contacts = contacts;
                self.phase = Phase::Ready;
                self.table_visible = true;
            }
            Err(msg) => self.phase = Phase::Failed(msg),
        }
    }

    pub fn find(&self, contact_id: &str) -> Option<&Contact> {
        self.contacts.iter().find(|c| c.id == contact_id)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct DealsModal {
    pub contact_id: String,
    pub contact_name: String,
    pub phase: Phase,
    pub deals: Vec<Deal>,
}

impl DealsModal {
    /// Every open starts from scratch; nothing from a previous open is reused.
    pub fn open(contact_id: &str, contact_name: &str) -> Self {
        Self {
            contact_id: contact_id.to_string(),
            contact_name: contact_name.to_string(),
            phase: Phase::Loading,
            deals: Vec::new(),
        }
    }

    pub fn finish(&mut self, outcome: Result<Vec<Deal>, String>) {
        match outcome {
            Ok(deals) => {
                self.deals = deals;
                self.phase = Phase::Ready;
            }
            Err(msg) => self.phase = Phase::Failed(msg),
        }
    }
}

/// Create-contact form fields, as posted by the panel page.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct ContactForm {
    pub firstname: String,
    pub lastname: String,
    pub email: String,
    pub phone: String,
    pub address: String,
}

impl ContactForm {
    /// Property bag with empty fields dropped.
    pub fn to_properties(&self) -> Value {
        let mut props = Map::new();
        for (key, value) in [
            ("firstname", &self.firstname),
            ("lastname", &self.lastname),
            ("email", &self.email),
            ("phone", &self.phone),
            ("address", &self.address),
        ] {
            if !value.is_empty() {
                props.insert(key.to_string(), Value::String(value.clone()));
            }
        }
        Value::Object(props)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct DealForm {
    pub dealname: String,
    pub amount: String,
    #[serde(rename = "deal-contact-id")]
    pub contact_id: String,
}

impl DealForm {
    pub fn deal_properties(&self) -> Value {
        serde_json::json!({
            "dealname": self.dealname,
            "amount": self.amount,
            "dealstage": CLOSED_WON_STAGE,
        })
    }

    pub fn contact_id(&self) -> Option<&str> {
        Some(self.contact_id.as_str()).filter(|id| !id.is_empty())
    }
}

/// A form keeps its draft on failure and is reset on success.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FormState<T> {
    pub draft: T,
}

#[derive(Debug, Clone, Default)]
pub struct InsightState {
    pub phase: Phase,
    pub text: Option<String>,
    pub generated_at: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BannerSlot {
    CreateContact,
    CreateDeal,
    Insight,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BannerKind {
    Success,
    Error,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Banner {
    pub slot: BannerSlot,
    pub kind: BannerKind,
    pub message: String,
    pub shown_at: DateTime<Utc>,
    pub ttl: Duration,
}

impl Banner {
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        match now.signed_duration_since(self.shown_at).to_std() {
            Ok(age) => age >= self.ttl,
            // shown "in the future" relative to `now`
            Err(_) => false,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct PanelState {
    pub contacts: ContactsState,
    pub contact_form: FormState<ContactForm>,
    pub deal_form: FormState<DealForm>,
    pub deals_modal: Option<DealsModal>,
    pub insight: InsightState,
    pub banners: Vec<Banner>,
}

impl PanelState {
    /// Replaces any banner of the same slot and kind.
    pub fn show_banner(
        &mut self,
        slot: BannerSlot,
        kind: BannerKind,
        message: impl Into<String>,
        ttl: Duration,
        now: DateTime<Utc>,
    ) {
        self.banners.retain(|b| !(b.slot == slot && b.kind == kind));
        self.banners.push(Banner {
            slot,
            kind,
            message: message.into(),
            shown_at: now,
            ttl,
        });
    }

    pub fn clear_banners(&mut self, slot: BannerSlot) {
        self.banners.retain(|b| b.slot != slot);
    }

    /// Timers are independent of view changes: only age decides.
    pub fn expire_banners(&mut self, now: DateTime<Utc>) {
        self.banners.retain(|b| !b.is_expired(now));
    }

    pub fn banner(&self, slot: BannerSlot, kind: BannerKind) -> Option<&Banner> {
        self.banners.iter().find(|b| b.slot == slot && b.kind == kind)
    }
}
