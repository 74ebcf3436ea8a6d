// tests/panel_http.rs
//
// Server-rendered panel routes, end to end through the proxy and a stub CRM/LLM.

mod support;

use axum::body::Body;
use axum::http::{Method, Request, StatusCode};
use serde_json::{json, Value};

use support::{contact, deal, send_text, Stub, StubConfig};

fn form(uri: &str, body: &str) -> Request<Body> {
    Request::builder()
        .method(Method::POST)
        .uri(uri)
        .header("content-type", "application/x-www-form-urlencoded")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

#[tokio::test]
async fn page_lists_contacts_and_escapes_them() {
    let stub = Stub::spawn(StubConfig {
        contacts: vec![
            contact("1", "Ada", "Lovelace", "ada@example.com"),
            contact("2", "<b>Eve</b>", "X", "eve@example.com"),
        ],
        ..Default::default()
    })
    .await;

    let (status, html) = send_text(stub.app(false), get("/")).await;
    assert_eq!(status, StatusCode::OK);
    assert!(html.contains("<td>Ada</td>"), "{html}");
    assert!(html.contains("&lt;b&gt;Eve&lt;/b&gt;"));
    assert!(!html.contains("<b>Eve</b>"));
    assert!(html.contains("name=\"deal-contact-id\""));
    assert!(!html.contains("id=\"deals-modal\""));
}

#[tokio::test]
async fn empty_contact_list_shows_message() {
    let stub = Stub::spawn(StubConfig::default()).await;
    let (_, html) = send_text(stub.app(false), get("/")).await;
    assert!(html.contains("No contacts found"));
}

#[tokio::test]
async fn deals_query_opens_modal_with_fresh_deals() {
    let stub = Stub::spawn(StubConfig {
        contacts: vec![contact("1", "Ada", "Lovelace", "ada@example.com")],
        deals: vec![deal("11", "Pro plan", "99")],
        associations: vec!["11".into()],
        ..Default::default()
    })
    .await;

    let (status, html) = send_text(stub.app(false), get("/?deals_for=1")).await;
    assert_eq!(status, StatusCode::OK);
    assert!(html.contains("id=\"deals-modal\""));
    assert!(html.contains("<span id=\"deals-contact-name\">Ada Lovelace</span>"));
    assert!(html.contains("Pro plan"));
    assert_eq!(stub.count(Method::POST, "/crm/v3/objects/deals/batch/read"), 1);
}

#[tokio::test]
async fn contact_form_creates_and_shows_banner() {
    let stub = Stub::spawn(StubConfig::default()).await;
    let (status, html) = send_text(
        stub.app(false),
        form(
            "/panel/contacts",
            "firstname=Grace&lastname=Hopper&email=grace%40example.com&phone=&address=",
        ),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert!(html.contains("Contact created successfully! Grace Hopper has been added to HubSpot."));
    let call = stub
        .last(Method::POST, "/crm/v3/objects/contacts")
        .expect("contact forwarded");
    assert_eq!(call.body["properties"]["email"], "grace@example.com");
    assert!(call.body["properties"].get("phone").is_none(), "empty fields dropped");
}

#[tokio::test]
async fn deal_form_associates_selected_contact() {
    let stub = Stub::spawn(StubConfig::default()).await;
    let (_, html) = send_text(
        stub.app(false),
        form("/panel/deals", "dealname=Pro&amount=10&deal-contact-id=42"),
    )
    .await;

    assert!(html.contains("Deal created successfully! Pro has been added to HubSpot."));
    let body = stub
        .last(Method::POST, "/crm/v3/objects/deals")
        .expect("deal forwarded")
        .body;
    assert_eq!(body["properties"]["dealstage"], "closedwon");
    assert_eq!(body["associations"][0]["to"]["id"], "42");
}

/// Form body posting the insight dropdown's value: the contact summary as JSON.
fn insight_form(summary: Value) -> Request<Body> {
    let mut url = reqwest::Url::parse("http://panel.test/").unwrap();
    url.query_pairs_mut()
        .append_pair("ai-contact", &summary.to_string());
    form("/panel/insights", url.query().unwrap_or_default())
}

fn ada() -> Value {
    json!({ "id": "1", "firstname": "Ada", "lastname": "Lovelace", "email": "ada@example.com" })
}

#[tokio::test]
async fn insight_form_renders_markup() {
    let stub = Stub::spawn(StubConfig {
        contacts: vec![contact("1", "Ada", "Lovelace", "ada@example.com")],
        ..Default::default()
    })
    .await;

    let (_, html) = send_text(stub.app(true), insight_form(ada())).await;
    assert!(html.contains("<h4>Summary</h4>"), "{html}");
    assert!(html.contains("<strong>solid</strong>"));
    assert!(html.contains("name=\"ai-contact\""));
    assert_eq!(stub.count(Method::POST, "/v1/messages"), 1);
    let prompt = stub.last(Method::POST, "/v1/messages").unwrap().body["messages"][0]["content"]
        .as_str()
        .unwrap()
        .to_string();
    assert!(prompt.contains("Name: Ada Lovelace"), "{prompt}");
}

#[tokio::test]
async fn insight_uses_posted_contact_when_contact_list_fails() {
    let stub = Stub::spawn(StubConfig::default().failing(
        Method::GET,
        "/crm/v3/objects/contacts",
        503,
        json!({ "status": "error", "message": "unavailable" }),
    ))
    .await;

    let (status, html) = send_text(stub.app(true), insight_form(ada())).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(stub.count(Method::GET, "/crm/v3/objects/contacts"), 1);
    assert_eq!(stub.count(Method::POST, "/v1/messages"), 1);
    assert!(html.contains("<h4>Summary</h4>"), "{html}");
    assert!(html.contains("Failed to load contacts"), "{html}");
    assert!(!html.contains("Please select a contact"));
}

#[tokio::test]
async fn insight_without_selection_asks_for_contact() {
    let stub = Stub::spawn(StubConfig::default()).await;
    let (_, html) = send_text(stub.app(true), form("/panel/insights", "ai-contact=")).await;
    assert!(html.contains("Please select a contact"));
    assert_eq!(stub.count(Method::POST, "/v1/messages"), 0);
}

#[tokio::test]
async fn insight_without_key_shows_not_configured() {
    let stub = Stub::spawn(StubConfig {
        contacts: vec![contact("1", "Ada", "Lovelace", "ada@example.com")],
        ..Default::default()
    })
    .await;

    let (_, html) = send_text(stub.app(false), insight_form(ada())).await;
    assert!(html.contains("AI feature not configured"));
    assert_eq!(stub.count(Method::POST, "/v1/messages"), 0);
}
