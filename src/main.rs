//! CRM panel proxy: binary entrypoint.
//! Loads configuration, then serves the JSON API and the admin panel until a
//! shutdown trigger arrives.

use std::net::SocketAddr;

use anyhow::Context;
use tracing::{error, info};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use crm_panel_proxy::shutdown::Shutdown;
use crm_panel_proxy::{router, AppConfig, AppState};

/// Compact logs by default; `LOG_FORMAT=json` for one JSON object per line.
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let json = std::env::var("LOG_FORMAT")
        .map(|v| v.eq_ignore_ascii_case("json"))
        .unwrap_or(false);

    let registry = tracing_subscriber::registry().with(filter);
    if json {
        registry.with(fmt::layer().json()).init();
    } else {
        registry.with(fmt::layer().compact()).init();
    }
}

async fn serve(cfg: AppConfig) -> anyhow::Result<()> {
    let shutdown = Shutdown::new();
    shutdown.install_panic_hook();

    let state = AppState::from_config(&cfg)?;
    let app = router(state);

    let addr = SocketAddr::from(([0, 0, 0, 0], cfg.port));
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;
    info!(%addr, "server listening");
    info!("API endpoints: /api/contacts, /api/deals, /api/contacts/{{contactId}}/deals, /api/ai/insights");
    if cfg.metrics_enabled {
        info!("metrics exposed at /metrics");
    }

    let grace = cfg.shutdown_grace;
    axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            shutdown.wait(grace).await;
        })
        .await
        .context("server exited unexpectedly")?;

    info!("HTTP server closed");
    Ok(())
}

#[tokio::main]
async fn main() {
    // Load .env in local/dev; no-op when absent.
    let _ = dotenvy::dotenv();
    init_tracing();

    let cfg = match AppConfig::from_env() {
        Ok(cfg) => cfg,
        Err(e) => {
            error!(error = %format!("{e:#}"), "configuration error");
            std::process::exit(1);
        }
    };

    if let Err(e) = serve(cfg).await {
        error!(error = %format!("{e:#}"), "server failed");
        std::process::exit(1);
    }
}
