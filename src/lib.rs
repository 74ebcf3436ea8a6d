// src/lib.rs
// Public library surface for the binaries and integration tests.

pub mod api;
pub mod config;
pub mod crm;
pub mod error;
pub mod insight;
pub mod metrics;
pub mod panel;
pub mod proxy;
pub mod shutdown;

// Convenient access: `crm_panel_proxy::api::router` or `crm_panel_proxy::router`
pub use crate::api::{router, AppState};
pub use crate::config::AppConfig;

/// Build the full router from the process environment (and `config/panel.toml`).
pub fn app() -> anyhow::Result<axum::Router> {
    let cfg = AppConfig::from_env()?;
    Ok(router(AppState::from_config(&cfg)?))
}
