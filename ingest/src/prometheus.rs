//! Prometheus wiring and the request-level metrics middleware.

use std::time::Instant;

use axum::body::Body;
use axum::extract::MatchedPath;
use axum::http::Request;
use axum::middleware::Next;
use axum::response::IntoResponse;
use metrics::counter;
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};

pub const INGEST_EVENTS_DROPPED_TOTAL: &str = "ingest_events_dropped_total";

/// Record ingest events dropped before reaching the fact table, tagged by
/// drop cause.
pub fn report_dropped_events(cause: &'static str, quantity: u64) {
    counter!(INGEST_EVENTS_DROPPED_TOTAL, "cause" => cause).increment(quantity);
}

pub fn report_ingested_events(source_system: &str, quantity: u64) {
    counter!("ingest_events_received_total", "source" => source_system.to_string())
        .increment(quantity);
}

pub fn setup_metrics_recorder() -> PrometheusHandle {
    const BUCKETS: &[f64] = &[
        0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0,
    ];

    PrometheusBuilder::new()
        .set_buckets(BUCKETS)
        .expect("bucket list is non-empty")
        .install_recorder()
        .expect("failed to install prometheus recorder")
}

/// Middleware tracking every request with a counter and a duration histogram.
pub async fn track_metrics(req: Request<Body>, next: Next) -> impl IntoResponse {
    let start = Instant::now();

    let path = if let Some(matched_path) = req.extensions().get::<MatchedPath>() {
        matched_path.as_str().to_owned()
    } else {
        req.uri().path().to_owned()
    };

    let method = req.method().clone();

    let response = next.run(req).await;

    let latency = start.elapsed().as_secs_f64();
    let status = response.status().as_u16().to_string();

    let labels = [
        ("method", method.to_string()),
        ("path", path),
        ("status", status),
    ];

    metrics::counter!("http_requests_total", &labels).increment(1);
    metrics::histogram!("http_requests_duration_seconds", &labels).record(latency);

    response
}
