// src/config/crm.rs
use anyhow::{anyhow, Context, Result};
use serde::Deserialize;

pub const ENV_ACCESS_TOKEN: &str = "HUBSPOT_ACCESS_TOKEN";
pub const ENV_BASE_URL: &str = "HUBSPOT_API_BASE";
pub const ENV_ASSOCIATION_TYPE_ID: &str = "HUBSPOT_DEAL_CONTACT_ASSOCIATION_TYPE_ID";

pub const DEFAULT_BASE_URL: &str = "https://api.hubapi.com";
pub const DEFAULT_ASSOCIATION_CATEGORY: &str = "HUBSPOT_DEFINED";
/// Provider-registry id of the deal→contact association type.
pub const DEFAULT_ASSOCIATION_TYPE_ID: u32 = 3;

/// Association edge attached when a deal is created for a contact.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssociationSpec {
    pub category: String,
    pub type_id: u32,
}

impl Default for AssociationSpec {
    fn default() -> Self {
        Self {
            category: DEFAULT_ASSOCIATION_CATEGORY.to_string(),
            type_id: DEFAULT_ASSOCIATION_TYPE_ID,
        }
    }
}

#[derive(Debug, Clone)]
pub struct CrmConfig {
    pub token: String,
    /// No trailing slash.
    pub base_url: String,
    pub deal_contact_association: AssociationSpec,
}

impl CrmConfig {
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: token.into(),
            base_url: DEFAULT_BASE_URL.to_string(),
            deal_contact_association: AssociationSpec::default(),
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = trim_base(base_url.into());
        self
    }

    pub(crate) fn resolve<F>(section: CrmSection, env: &F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let token = env(ENV_ACCESS_TOKEN).ok_or_else(|| {
            anyhow!("{ENV_ACCESS_TOKEN} is not set; create a .env file with your HubSpot private app token")
        })?;

        let base_url = env(ENV_BASE_URL)
            .or(section.base_url)
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_string());

        let mut association = AssociationSpec::default();
        if let Some(a) = section.deal_contact_association {
            if let Some(c) = a.category.filter(|c| !c.trim().is_empty()) {
                association.category = c;
            }
            if let Some(id) = a.type_id {
                association.type_id = id;
            }
        }
        if let Some(v) = env(ENV_ASSOCIATION_TYPE_ID) {
            association.type_id = v
                .trim()
                .parse()
                .with_context(|| format!("invalid {ENV_ASSOCIATION_TYPE_ID}: {v}"))?;
        }

        Ok(Self {
            token: token.trim().to_string(),
            base_url: trim_base(base_url),
            deal_contact_association: association,
        })
    }
}

pub(crate) fn trim_base(url: String) -> String {
    url.trim().trim_end_matches('/').to_string()
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub(crate) struct CrmSection {
    base_url: Option<String>,
    deal_contact_association: Option<AssociationSection>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct AssociationSection {
    category: Option<String>,
    type_id: Option<u32>,
}
