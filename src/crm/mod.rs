// src/crm/mod.rs
pub mod client;
pub mod types;

pub use client::CrmClient;
pub use types::{Contact, ContactProperties, Deal, DealProperties, ListEnvelope};
