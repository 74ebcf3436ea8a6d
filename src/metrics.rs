use std::time::Duration;

use axum::{routing::get, Router};
use ::metrics::{counter, describe_counter, describe_histogram, histogram};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use once_cell::sync::OnceCell;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Upstream {
    Crm,
    Llm,
}

impl Upstream {
    fn label(self) -> &'static str {
        match self {
            Upstream::Crm => "crm",
            Upstream::Llm => "llm",
        }
    }
}

pub struct Metrics {
    pub handle: PrometheusHandle,
}

impl Metrics {
    /// Install the Prometheus recorder once per process; later calls share the same handle.
    pub fn init() -> anyhow::Result<Self> {
        static HANDLE: OnceCell<PrometheusHandle> = OnceCell::new();
        let handle = HANDLE
            .get_or_try_init(|| {
                let handle = PrometheusBuilder::new().install_recorder()?;
                describe_counter!(
                    "upstream_requests_total",
                    "Upstream API calls by upstream, operation and outcome."
                );
                describe_histogram!(
                    "upstream_request_ms",
                    "Upstream API call latency in milliseconds."
                );
                Ok::<_, anyhow::Error>(handle)
            })?
            .clone();
        Ok(Self { handle })
    }

    /// Returns a router exposing `/metrics` with the Prometheus exposition format.
    pub fn router<S>(&self) -> Router<S>
    where
        S: Clone + Send + Sync + 'static,
    {
        let handle = self.handle.clone();
        Router::new().route(
            "/metrics",
            get(move || {
                let h = handle.clone();
                async move { h.render() }
            }),
        )
    }
}

/// Record one upstream call. No-op until a recorder is installed.
pub fn observe_upstream(upstream: Upstream, operation: &'static str, ok: bool, elapsed: Duration) {
    let outcome = if ok { "ok" } else { "error" };
    counter!(
        "upstream_requests_total",
        "upstream" => upstream.label(),
        "operation" => operation,
        "outcome" => outcome
    )
    .increment(1);
    histogram!(
        "upstream_request_ms",
        "upstream" => upstream.label(),
        "operation" => operation
    )
    .record(elapsed.as_secs_f64() * 1000.0);
}
