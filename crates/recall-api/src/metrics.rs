//! Prometheus metrics for monitoring API traffic and review scheduling.

use std::time::Instant;

use axum::{
    extract::{Request, State},
    http::StatusCode,
    middleware::Next,
    response::{IntoResponse, Response},
};
use metrics::{counter, gauge, histogram};
use metrics_exporter_prometheus::{Matcher, PrometheusBuilder, PrometheusHandle};
use recall_db::ReviewStore;
use uuid::Uuid;

use crate::state::ApiState;

/// Initialize Prometheus metrics exporter
pub fn init_metrics() -> anyhow::Result<PrometheusHandle> {
    let builder = PrometheusBuilder::new();

    // Configure histogram buckets for request duration (in seconds)
    let builder = builder.set_buckets_for_metric(
        Matcher::Full("http_request_duration_seconds".to_string()),
        &[
            0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0,
        ],
    )?;

    let handle = builder.install_recorder()?;

    Ok(handle)
}

/// Middleware to record HTTP request metrics
pub async fn track_metrics(req: Request, next: Next) -> Response {
    let start = Instant::now();
    let method = req.method().to_string();
    let path = normalize_path(req.uri().path());

    let in_flight = gauge!("http_requests_in_flight", "method" => method.clone(), "path" => path.clone());
    in_flight.increment(1.0);

    let response = next.run(req).await;

    in_flight.decrement(1.0);

    let duration = start.elapsed().as_secs_f64();
    let status = response.status().as_u16().to_string();

    counter!(
        "http_requests_total",
        "method" => method.clone(),
        "path" => path.clone(),
        "status" => status.clone()
    )
    .increment(1);

    histogram!(
        "http_request_duration_seconds",
        "method" => method,
        "path" => path,
        "status" => status
    )
    .record(duration);

    response
}

/// Normalize URL paths to reduce cardinality in metrics
/// Replaces UUID and numeric segments with `:id`
fn normalize_path(path: &str) -> String {
    path.split('/')
        .map(|segment| {
            let is_id = Uuid::try_parse(segment).is_ok()
                || (!segment.is_empty() && segment.bytes().all(|b| b.is_ascii_digit()));
            if is_id { ":id" } else { segment }
        })
        .collect::<Vec<_>>()
        .join("/")
}

/// Handler for the /metrics endpoint
pub async fn metrics_handler<S: ReviewStore>(State(state): State<ApiState<S>>) -> Response {
    match state.metrics {
        Some(handle) => (StatusCode::OK, handle.render()).into_response(),
        None => (StatusCode::NOT_FOUND, "Metrics are not enabled").into_response(),
    }
}

/// Record a committed review
pub fn record_review(was_correct: bool) {
    let outcome = if was_correct { "correct" } else { "lapse" };
    counter!("reviews_total", "outcome" => outcome).increment(1);
}

/// Record a compare-and-swap that lost to a concurrent update
pub fn record_revision_conflict() {
    counter!("review_revision_conflicts_total").increment(1);
}

/// Record a review abandoned after exhausting its retries
pub fn record_contention() {
    counter!("review_contention_total").increment(1);
}
