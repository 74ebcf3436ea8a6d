// src/config/mod.rs
//! Startup configuration: an optional TOML file overlaid with environment variables.
//!
//! The resulting [`AppConfig`] is built once in `main` and handed to the service;
//! nothing reads credentials from the environment after that.

pub mod ai;
pub mod crm;

use anyhow::{anyhow, Context, Result};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

pub use ai::AiConfig;
pub use crm::{AssociationSpec, CrmConfig};

// --- env defaults & names ---
pub const DEFAULT_CONFIG_PATH: &str = "config/panel.toml";
pub const DEFAULT_PORT: u16 = 3001;
pub const DEFAULT_SHUTDOWN_GRACE_SECS: u64 = 10;

pub const ENV_CONFIG_PATH: &str = "PANEL_CONFIG_PATH";
pub const ENV_PORT: &str = "PORT";
pub const ENV_SHUTDOWN_GRACE_SECS: &str = "SHUTDOWN_GRACE_SECS";
pub const ENV_METRICS: &str = "PANEL_METRICS";

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub port: u16,
    pub shutdown_grace: Duration,
    pub metrics_enabled: bool,
    pub crm: CrmConfig,
    pub ai: AiConfig,
}

impl AppConfig {
    /// Defaults for everything except the CRM token.
    pub fn new(crm: CrmConfig, ai: AiConfig) -> Self {
        Self {
            port: DEFAULT_PORT,
            shutdown_grace: Duration::from_secs(DEFAULT_SHUTDOWN_GRACE_SECS),
            metrics_enabled: false,
            crm,
            ai,
        }
    }

    /// Load using the process environment:
    /// 1) TOML file at $PANEL_CONFIG_PATH (must exist when set)
    /// 2) else config/panel.toml if present
    /// 3) env overrides + secrets
    pub fn from_env() -> Result<Self> {
        let file = match std::env::var(ENV_CONFIG_PATH) {
            Ok(p) => {
                let pb = PathBuf::from(p);
                if !pb.exists() {
                    return Err(anyhow!("{ENV_CONFIG_PATH} points to non-existent path"));
                }
                Some(read_file(&pb)?)
            }
            Err(_) => {
                let pb = PathBuf::from(DEFAULT_CONFIG_PATH);
                if pb.exists() {
                    Some(read_file(&pb)?)
                } else {
                    None
                }
            }
        };
        Self::from_sources(file.as_deref(), |key| std::env::var(key).ok())
    }

    /// Build from optional TOML text and an env lookup. Env values win over file values.
    pub fn from_sources<F>(toml_text: Option<&str>, lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let file: FileConfig = match toml_text {
            Some(s) => toml::from_str(s).context("parsing panel config TOML")?,
            None => FileConfig::default(),
        };
        // Blank values count as unset.
        let env = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let crm = CrmConfig::resolve(file.crm, &env)?;
        let ai = AiConfig::resolve(file.ai, &env)?;

        let port = match env(ENV_PORT) {
            Some(v) => v
                .trim()
                .parse::<u16>()
                .with_context(|| format!("invalid {ENV_PORT}: {v}"))?,
            None => file.server.port.unwrap_or(DEFAULT_PORT),
        };
        let grace_secs = match env(ENV_SHUTDOWN_GRACE_SECS) {
            Some(v) => v
                .trim()
                .parse::<u64>()
                .with_context(|| format!("invalid {ENV_SHUTDOWN_GRACE_SECS}: {v}"))?,
            None => file
                .server
                .shutdown_grace_secs
                .unwrap_or(DEFAULT_SHUTDOWN_GRACE_SECS),
        };
        let metrics_enabled = match env(ENV_METRICS) {
            Some(v) => parse_flag(&v),
            None => file.server.metrics.unwrap_or(false),
        };

        Ok(Self {
            port,
            shutdown_grace: Duration::from_secs(grace_secs),
            metrics_enabled,
            crm,
            ai,
        })
    }
}

fn read_file(path: &Path) -> Result<String> {
    fs::read_to_string(path).with_context(|| format!("reading panel config from {}", path.display()))
}

pub(crate) fn parse_flag(v: &str) -> bool {
    matches!(
        v.trim().to_ascii_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}

/* ----------------------------
File schema (from TOML)
---------------------------- */

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct FileConfig {
    server: ServerSection,
    crm: crm::CrmSection,
    ai: ai::AiSection,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct ServerSection {
    port: Option<u16>,
    shutdown_grace_secs: Option<u64>,
    metrics: Option<bool>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |k| map.get(k).cloned()
    }

    #[test]
    fn missing_crm_token_is_an_error() {
        let err = AppConfig::from_sources(None, lookup(&[])).unwrap_err();
        assert!(err.to_string().contains("HUBSPOT_ACCESS_TOKEN"), "{err:#}");
    }

    #[test]
    fn blank_crm_token_is_an_error() {
        let res = AppConfig::from_sources(None, lookup(&[("HUBSPOT_ACCESS_TOKEN", "  ")]));
        assert!(res.is_err());
    }

    #[test]
    fn defaults_apply_with_only_token() {
        let cfg = AppConfig::from_sources(None, lookup(&[("HUBSPOT_ACCESS_TOKEN", "pat-1")]))
            .unwrap();
        assert_eq!(cfg.port, 3001);
        assert_eq!(cfg.shutdown_grace, Duration::from_secs(10));
        assert!(!cfg.metrics_enabled);
        assert_eq!(cfg.crm.token, "pat-1");
        assert_eq!(cfg.crm.base_url, "https://api.hubapi.com");
        assert_eq!(cfg.crm.deal_contact_association.type_id, 3);
        assert_eq!(cfg.crm.deal_contact_association.category, "HUBSPOT_DEFINED");
        assert!(cfg.ai.api_key.is_none());
        assert_eq!(cfg.ai.max_tokens, 300);
    }

    #[test]
    fn env_overrides_file_values() {
        let toml = r#"
[server]
port = 8080
metrics = true

[crm]
base_url = "http://crm.local/"

[crm.deal_contact_association]
type_id = 5

[ai]
model = "file-model"
max_tokens = 120
"#;
        let cfg = AppConfig::from_sources(
            Some(toml),
            lookup(&[
                ("HUBSPOT_ACCESS_TOKEN", "pat-1"),
                ("PORT", "9090"),
                ("ANTHROPIC_MODEL", "env-model"),
                ("ANTHROPIC_API_KEY", "sk-test"),
            ]),
        )
        .unwrap();
        assert_eq!(cfg.port, 9090);
        assert!(cfg.metrics_enabled);
        assert_eq!(cfg.crm.base_url, "http://crm.local");
        assert_eq!(cfg.crm.deal_contact_association.type_id, 5);
        assert_eq!(cfg.ai.model, "env-model");
        assert_eq!(cfg.ai.max_tokens, 120);
        assert_eq!(cfg.ai.api_key.as_deref(), Some("sk-test"));
    }

    #[test]
    fn invalid_port_is_rejected() {
        let res = AppConfig::from_sources(
            None,
            lookup(&[("HUBSPOT_ACCESS_TOKEN", "pat-1"), ("PORT", "nope")]),
        );
        assert!(res.is_err());
    }
}
