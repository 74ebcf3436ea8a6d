//! Renders the admin panel from a running proxy and prints the HTML.
//!
//! Usage: `panel_snapshot [PROXY_URL] [CONTACT_ID]`. The URL falls back to
//! `PANEL_PROXY_URL`, then `http://localhost:3001`. A contact id opens its deals modal.

use crm_panel_proxy::panel::{HttpBackend, PanelController};

const DEFAULT_PROXY_URL: &str = "http://localhost:3001";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _ = dotenvy::dotenv();
    tracing_subscriber::fmt()
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let mut args = std::env::args().skip(1);
    let url = args
        .next()
        .or_else(|| std::env::var("PANEL_PROXY_URL").ok())
        .unwrap_or_else(|| DEFAULT_PROXY_URL.to_string());
    let contact_id = args.next();

    let mut panel = PanelController::new(HttpBackend::new(&url)?);
    panel.init().await;

    if let Some(id) = contact_id {
        let name = panel
            .state()
            .contacts
            .find(&id)
            .map(crm_panel_proxy::panel::view::contact_name)
            .unwrap_or_default();
        panel.view_contact_deals(&id, &name).await;
    }

    println!("{}", crm_panel_proxy::panel::html::to_html(&panel.view()));
    Ok(())
}
