// tests/metrics.rs
//
// /metrics is mounted only when enabled and reports upstream calls.

mod support;

use axum::http::{Method, StatusCode};

use crm_panel_proxy::{router, AppState};
use support::{send_json, send_text, Stub, StubConfig};

#[tokio::test]
async fn metrics_endpoint_reports_upstream_calls() {
    let stub = Stub::spawn(StubConfig::default()).await;
    let mut cfg = stub.config(false);
    cfg.metrics_enabled = true;
    let app = router(AppState::from_config(&cfg).expect("state with metrics"));

    let (status, _) = send_json(app.clone(), Method::GET, "/api/contacts", None).await;
    assert_eq!(status, StatusCode::OK);

    let req = axum::http::Request::get("/metrics")
        .body(axum::body::Body::empty())
        .unwrap();
    let (status, text) = send_text(app, req).await;
    assert_eq!(status, StatusCode::OK);
    for needle in [
        "upstream_requests_total",
        "upstream=\"crm\"",
        "operation=\"list_contacts\"",
        "outcome=\"ok\"",
        "upstream_request_ms",
    ] {
        assert!(text.contains(needle), "missing {needle} in:\n{text}");
    }
}

#[tokio::test]
async fn metrics_route_absent_when_disabled() {
    let stub = Stub::spawn(StubConfig::default()).await;
    let (status, _) = send_json(stub.app(false), Method::GET, "/metrics", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}
