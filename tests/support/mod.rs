// tests/support/mod.rs
//
// Stub CRM + LLM upstream: one real axum server on 127.0.0.1:0 that records every
// call it receives. Tests point the proxy at it through `AppConfig`.
#![allow(dead_code)]

use std::sync::Arc;

use axum::{
    body::{self, Body, Bytes},
    extract::State,
    http::{HeaderMap, Method, Request, StatusCode, Uri},
    response::{IntoResponse, Response},
    Json, Router,
};
use parking_lot::Mutex;
use serde_json::{json, Value};
use tower::ServiceExt as _;

use crm_panel_proxy::config::{AiConfig, AppConfig, CrmConfig};
use crm_panel_proxy::{router, AppState};

pub const BODY_LIMIT: usize = 1024 * 1024;

#[derive(Debug, Clone)]
pub struct Call {
    pub method: Method,
    pub path: String,
    pub query: Option<String>,
    pub headers: HeaderMap,
    pub body: Value,
}

#[derive(Debug, Clone)]
pub enum LlmReply {
    Text(String),
    Error(u16, Value),
}

#[derive(Debug, Clone)]
pub struct StubConfig {
    pub contacts: Vec<Value>,
    pub deals: Vec<Value>,
    /// Deal ids returned by the contact → deals association lookup.
    pub associations: Vec<String>,
    /// `(method, path, status, body)` answered instead of the normal response.
    pub failures: Vec<(Method, String, u16, Value)>,
    pub llm: LlmReply,
}

impl Default for StubConfig {
    fn default() -> Self {
        Self {
            contacts: Vec::new(),
            deals: Vec::new(),
            associations: Vec::new(),
            failures: Vec::new(),
            llm: LlmReply::Text("## Summary\nA **solid** lead.".into()),
        }
    }
}

impl StubConfig {
    pub fn failing(mut self, method: Method, path: &str, status: u16, body: Value) -> Self {
        self.failures.push((method, path.to_string(), status, body));
        self
    }
}

struct Inner {
    cfg: StubConfig,
    calls: Mutex<Vec<Call>>,
}

pub struct Stub {
    pub base: String,
    inner: Arc<Inner>,
    handle: tokio::task::JoinHandle<()>,
}

impl Drop for Stub {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

impl Stub {
    pub async fn spawn(cfg: StubConfig) -> Self {
        let inner = Arc::new(Inner {
            cfg,
            calls: Mutex::new(Vec::new()),
        });
        let app = Router::new().fallback(handle).with_state(inner.clone());

        let listener = tokio::net::TcpListener::bind(("127.0.0.1", 0))
            .await
            .expect("bind stub listener");
        let addr = listener.local_addr().expect("stub listener addr");
        let handle = tokio::spawn(async move {
            let _ = axum::serve(listener, app).await;
        });

        Self {
            base: format!("http://{addr}"),
            inner,
            handle,
        }
    }

    pub fn calls(&self) -> Vec<Call> {
        self.inner.calls.lock().clone()
    }

    pub fn count(&self, method: Method, path: &str) -> usize {
        self.inner
            .calls
            .lock()
            .iter()
            .filter(|c| c.method == method && c.path == path)
            .count()
    }

    pub fn last(&self, method: Method, path: &str) -> Option<Call> {
        self.inner
            .calls
            .lock()
            .iter()
            .rev()
            .find(|c| c.method == method && c.path == path)
            .cloned()
    }

    /// Proxy config pointed at this stub; the AI key is present only when `with_ai`.
    pub fn config(&self, with_ai: bool) -> AppConfig {
        let crm = CrmConfig::new("pat-test").with_base_url(&self.base);
        let mut ai = AiConfig::default().with_base_url(&self.base);
        if with_ai {
            ai = ai.with_api_key("sk-test");
        }
        AppConfig::new(crm, ai)
    }

    pub fn state(&self, with_ai: bool) -> AppState {
        AppState::from_config(&self.config(with_ai)).expect("state from stub config")
    }

    pub fn app(&self, with_ai: bool) -> Router {
        router(self.state(with_ai))
    }
}

async fn handle(
    State(inner): State<Arc<Inner>>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    raw: Bytes,
) -> Response {
    let path = uri.path().to_string();
    let body: Value = serde_json::from_slice(&raw).unwrap_or(Value::Null);
    inner.calls.lock().push(Call {
        method: method.clone(),
        path: path.clone(),
        query: uri.query().map(str::to_string),
        headers,
        body: body.clone(),
    });

    let cfg = &inner.cfg;
    if let Some((_, _, status, fail)) = cfg
        .failures
        .iter()
        .find(|(m, p, _, _)| *m == method && *p == path)
    {
        let status = StatusCode::from_u16(*status).expect("valid stub status");
        return (status, Json(fail.clone())).into_response();
    }

    let segments: Vec<&str> = path.trim_start_matches('/').split('/').collect();
    match (method.as_str(), segments.as_slice()) {
        ("GET", ["crm", "v3", "objects", "contacts"]) => {
            Json(json!({ "results": cfg.contacts })).into_response()
        }
        ("POST", ["crm", "v3", "objects", "contacts"]) => Json(json!({
            "id": "42",
            "properties": body["properties"],
        }))
        .into_response(),
        ("GET", ["crm", "v3", "objects", "deals"]) => {
            Json(json!({ "results": cfg.deals })).into_response()
        }
        ("POST", ["crm", "v3", "objects", "deals"]) => Json(json!({
            "id": "900",
            "properties": body["properties"],
        }))
        .into_response(),
        ("GET", ["crm", "v3", "objects", "contacts", _, "associations", "deals"]) => {
            let results: Vec<Value> = cfg
                .associations
                .iter()
                .map(|id| json!({ "id": id, "type": "contact_to_deal" }))
                .collect();
            Json(json!({ "results": results })).into_response()
        }
        ("POST", ["crm", "v3", "objects", "deals", "batch", "read"]) => {
            let wanted: Vec<&str> = body["inputs"]
                .as_array()
                .map(|a| a.iter().filter_map(|i| i["id"].as_str()).collect())
                .unwrap_or_default();
            let results: Vec<&Value> = cfg
                .deals
                .iter()
                .filter(|d| d["id"].as_str().is_some_and(|id| wanted.contains(&id)))
                .collect();
            Json(json!({ "status": "COMPLETE", "results": results })).into_response()
        }
        ("POST", ["v1", "messages"]) => match &cfg.llm {
            LlmReply::Text(text) => Json(json!({
                "content": [{ "type": "text", "text": text }],
            }))
            .into_response(),
            LlmReply::Error(status, err) => {
                let status = StatusCode::from_u16(*status).expect("valid stub status");
                (status, Json(err.clone())).into_response()
            }
        },
        _ => (StatusCode::NOT_FOUND, Json(json!({ "message": "no stub route" }))).into_response(),
    }
}

pub fn contact(id: &str, first: &str, last: &str, email: &str) -> Value {
    json!({
        "id": id,
        "properties": { "firstname": first, "lastname": last, "email": email },
    })
}

pub fn deal(id: &str, name: &str, amount: &str) -> Value {
    json!({
        "id": id,
        "properties": { "dealname": name, "amount": amount, "dealstage": "closedwon" },
    })
}

/// Send one request through the router; returns status and parsed JSON body.
pub async fn send_json(app: Router, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let mut req = Request::builder().method(method).uri(uri);
    let body = match body {
        Some(v) => {
            req = req.header("content-type", "application/json");
            Body::from(v.to_string())
        }
        None => Body::empty(),
    };
    let resp = app
        .oneshot(req.body(body).expect("build request"))
        .await
        .expect("oneshot");
    let status = resp.status();
    let bytes = body::to_bytes(resp.into_body(), BODY_LIMIT)
        .await
        .expect("read body");
    let v = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, v)
}

pub async fn send_text(app: Router, req: Request<Body>) -> (StatusCode, String) {
    let resp = app.oneshot(req).await.expect("oneshot");
    let status = resp.status();
    let bytes = body::to_bytes(resp.into_body(), BODY_LIMIT)
        .await
        .expect("read body");
    (status, String::from_utf8(bytes.to_vec()).expect("utf8"))
}
