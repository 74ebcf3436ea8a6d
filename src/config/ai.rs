// src/config/ai.rs
use anyhow::Result;
use serde::Deserialize;

use super::crm::trim_base;

pub const ENV_API_KEY: &str = "ANTHROPIC_API_KEY";
pub const ENV_BASE_URL: &str = "ANTHROPIC_API_BASE";
pub const ENV_MODEL: &str = "ANTHROPIC_MODEL";

pub const DEFAULT_BASE_URL: &str = "https://api.anthropic.com";
pub const DEFAULT_MODEL: &str = "claude-sonnet-4-20250514";
pub const DEFAULT_MAX_TOKENS: u32 = 300;
pub const DEFAULT_API_VERSION: &str = "2023-06-01";

#[derive(Debug, Clone)]
pub struct AiConfig {
    /// `None` disables insight generation; requests fail fast with "not configured".
    pub api_key: Option<String>,
    pub base_url: String,
    pub model: String,
    pub max_tokens: u32,
    pub api_version: String,
}

impl Default for AiConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: DEFAULT_BASE_URL.to_string(),
            model: DEFAULT_MODEL.to_string(),
            max_tokens: DEFAULT_MAX_TOKENS,
            api_version: DEFAULT_API_VERSION.to_string(),
        }
    }
}

impl AiConfig {
    pub fn with_api_key(mut self, key: impl Into<String>) -> Self {
        self.api_key = Some(key.into());
        self
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = trim_base(base_url.into());
        self
    }

    pub fn is_configured(&self) -> bool {
        self.api_key.is_some()
    }

    pub(crate) fn resolve<F>(section: AiSection, env: &F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let d = Self::default();
        let base_url = env(ENV_BASE_URL)
            .or(section.base_url)
            .unwrap_or(d.base_url);
        Ok(Self {
            api_key: env(ENV_API_KEY).map(|k| k.trim().to_string()),
            base_url: trim_base(base_url),
            model: env(ENV_MODEL).or(section.model).unwrap_or(d.model),
            max_tokens: section.max_tokens.filter(|n| *n > 0).unwrap_or(d.max_tokens),
            api_version: section.api_version.unwrap_or(d.api_version),
        })
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub(crate) struct AiSection {
    base_url: Option<String>,
    model: Option<String>,
    max_tokens: Option<u32>,
    api_version: Option<String>,
}
