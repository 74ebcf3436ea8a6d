// src/crm/types.rs
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// Properties requested when listing contacts.
pub const CONTACT_PROPERTIES: [&str; 7] = [
    "firstname",
    "lastname",
    "email",
    "phone",
    "address",
    "jobtitle",
    "company",
];

/// Properties requested for deals, in list and batch-read calls alike.
pub const DEAL_PROPERTIES: [&str; 5] = ["dealname", "amount", "dealstage", "closedate", "pipeline"];

/// Upstream list page size. Only the first page is ever fetched.
pub const PAGE_LIMIT: u32 = 50;

/// Stage written on every deal the panel creates.
pub const CLOSED_WON_STAGE: &str = "closedwon";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Contact {
    #[serde(deserialize_with = "id_string")]
    pub id: String,
    #[serde(default, deserialize_with = "null_default")]
    pub properties: ContactProperties,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ContactProperties {
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
    #[serde(skip_serializing_if = "Option::is_none")]
    pub jobtitle: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub company: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Deal {
    #[serde(deserialize_with = "id_string")]
    pub id: String,
    #[serde(default, deserialize_with = "null_default")]
    pub properties: DealProperties,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DealProperties {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dealname: Option<String>,
    /// Decimal string, as the CRM stores it.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub amount: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dealstage: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub closedate: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pipeline: Option<String>,
}

/// `{results: [...]}` envelope used by list, batch-read and association calls.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(bound(deserialize = "T: Deserialize<'de>"))]
pub struct ListEnvelope<T> {
    #[serde(default = "Vec::new", deserialize_with = "null_default")]
    pub results: Vec<T>,
}

impl<T> Default for ListEnvelope<T> {
    fn default() -> Self {
        Self {
            results: Vec::new(),
        }
    }
}

/// One row of the contact→deals association lookup.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct AssociationRef {
    #[serde(deserialize_with = "id_string")]
    pub id: String,
}

/// Body of the deal create call.
#[derive(Debug, Clone, Serialize)]
pub struct CreateDealPayload {
    pub properties: Value,
    pub associations: Vec<AssociationEdge>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssociationEdge {
    pub to: ObjectRef,
    pub types: Vec<AssociationType>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ObjectRef {
    pub id: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssociationType {
    pub association_category: String,
    pub association_type_id: u32,
}

/// Body of the deals batch-read call.
#[derive(Debug, Clone, Serialize)]
pub struct BatchReadPayload<'a> {
    pub inputs: Vec<ObjectRef>,
    pub properties: &'a [&'a str],
}

// The CRM sends ids as strings, but numeric ids show up in some association payloads.
fn id_string<'de, D>(de: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum RawId {
        Text(String),
        Number(u64),
    }
    Ok(match RawId::deserialize(de)? {
        RawId::Text(s) => s,
        RawId::Number(n) => n.to_string(),
    })
}

/// Optional string that may arrive as a JSON number (ids, amounts); `null` is `None`.
pub(crate) fn opt_text<'de, D>(de: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum RawText {
        Text(String),
        Number(serde_json::Number),
    }
    Ok(Option::<RawText>::deserialize(de)?.map(|raw| match raw {
        RawText::Text(s) => s,
        RawText::Number(n) => n.to_string(),
    }))
}

fn null_default<'de, D, T>(de: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(de)?.unwrap_or_default())
}
