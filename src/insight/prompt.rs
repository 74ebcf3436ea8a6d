// src/insight/prompt.rs
use serde::{Deserialize, Serialize};

use crate::crm::types::opt_text;
use crate::crm::{Contact, Deal};

/// Contact fields the insight prompt uses. Also carried by the panel's insight dropdown.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ContactSummary {
    #[serde(skip_serializing_if = "Option::is_none", deserialize_with = "opt_text")]
    pub id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub firstname: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lastname: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
}

impl From<&Contact> for ContactSummary {
    fn from(c: &Contact) -> Self {
        let p = &c.properties;
        Self {
            id: Some(c.id.clone()),
            firstname: p.firstname.clone(),
            lastname: p.lastname.clone(),
            email: p.email.clone(),
            phone: p.phone.clone(),
            address: p.address.clone(),
        }
    }
}

/// The single most recent deal passed along with a contact.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DealSummary {
    #[serde(skip_serializing_if = "Option::is_none", deserialize_with = "opt_text")]
    pub dealname: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none", deserialize_with = "opt_text")]
    pub amount: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none", deserialize_with = "opt_text")]
    pub dealstage: Option<String>,
}

impl From<&Deal> for DealSummary {
    fn from(d: &Deal) -> Self {
        Self {
            dealname: d.properties.dealname.clone(),
            amount: d.properties.amount.clone(),
            dealstage: d.properties.dealstage.clone(),
        }
    }
}

/// Body of `POST /api/ai/insights`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InsightRequest {
    #[serde(default)]
    pub contact_data: ContactSummary,
    #[serde(default)]
    pub deal_data: Option<DealSummary>,
}

const NOT_PROVIDED: &str = "Not provided";

/// Fixed analyst prompt for one contact and its optional most recent deal.
pub fn build_prompt(contact: &ContactSummary, deal: Option<&DealSummary>) -> String {
    let text = |v: &Option<String>| v.as_deref().unwrap_or("").to_string();
    let or_missing = |v: &Option<String>| {
        v.as_deref()
            .filter(|s| !s.trim().is_empty())
            .unwrap_or(NOT_PROVIDED)
            .to_string()
    };

    let subscription = match deal {
        Some(d) => format!(
            "Subscription Information:\n- Deal: {}\n- Amount: ${}\n- Stage: {}",
            text(&d.dealname),
            text(&d.amount),
            text(&d.dealstage)
        ),
        None => "No subscription data yet - customer is in free trial period.".to_string(),
    };

    format!(
        "You are a customer success analyst for Breezy, a smart thermostat company. \
Analyze this customer data and provide actionable insights.

Customer Information:
- Name: {first} {last}
- Email: {email}
- Phone: {phone}
- Address: {address}

{subscription}

Provide a structured analysis using this exact format:

**Customer Engagement Level:**
[1-2 sentences about engagement]

**Upsell/Retention Recommendations:**
[1-2 sentences with specific recommendations]

**Next Best Action:**
[1-2 sentences with clear action items]

Keep it concise, actionable, and use the exact section headers shown above.",
        first = text(&contact.firstname),
        last = text(&contact.lastname),
        email = text(&contact.email),
        phone = or_missing(&contact.phone),
        address = or_missing(&contact.address),
    )
}
