use std::time::{Duration, Instant};

use actix_web::{
    body::MessageBody,
    dev::{ServiceRequest, ServiceResponse},
    middleware::Next,
    Error, HttpResponse,
};
use once_cell::sync::Lazy;
use prometheus::{Encoder, HistogramOpts, HistogramVec, IntCounterVec, Opts, TextEncoder};

use crate::models::RelayOutcome;

static HTTP_REQUESTS_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    let counter = IntCounterVec::new(
        Opts::new(
            "push_relay_http_requests_total",
            "Total HTTP requests handled by push-relay",
        ),
        &["method", "path", "status"],
    )
    .expect("failed to create push_relay_http_requests_total");
    prometheus::default_registry()
        .register(Box::new(counter.clone()))
        .expect("failed to register push_relay_http_requests_total");
    counter
});

static HTTP_REQUEST_DURATION_SECONDS: Lazy<HistogramVec> = Lazy::new(|| {
    let histogram = HistogramVec::new(
        HistogramOpts::new(
            "push_relay_http_request_duration_seconds",
            "HTTP request latency for push-relay",
        )
        .buckets(vec![0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0]),
        &["method", "path", "status"],
    )
    .expect("failed to create push_relay_http_request_duration_seconds");
    prometheus::default_registry()
        .register(Box::new(histogram.clone()))
        .expect("failed to register push_relay_http_request_duration_seconds");
    histogram
});

/// Relay outcomes by kind: skipped, delivered, failed
static RELAY_EVENTS_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    let counter = IntCounterVec::new(
        Opts::new(
            "push_relay_events_total",
            "Notification documents processed, by outcome",
        ),
        &["outcome"],
    )
    .expect("failed to create push_relay_events_total");
    prometheus::default_registry()
        .register(Box::new(counter.clone()))
        .expect("failed to register push_relay_events_total");
    counter
});

pub fn record_outcome(outcome: &RelayOutcome) {
    RELAY_EVENTS_TOTAL
        .with_label_values(&[outcome.as_label()])
        .inc();
}

pub fn outcome_count(label: &str) -> u64 {
    RELAY_EVENTS_TOTAL.with_label_values(&[label]).get()
}

pub fn observe_http_request(method: &str, path: &str, status: u16, elapsed: Duration) {
    let status_label = status.to_string();
    HTTP_REQUESTS_TOTAL
        .with_label_values(&[method, path, &status_label])
        .inc();
    HTTP_REQUEST_DURATION_SECONDS
        .with_label_values(&[method, path, &status_label])
        .observe(elapsed.as_secs_f64());
}

/// Request metrics middleware, mounted with `middleware::from_fn`
pub async fn track_http(
    req: ServiceRequest,
    next: Next<impl MessageBody>,
) -> Result<ServiceResponse<impl MessageBody>, Error> {
    // Route pattern rather than raw path keeps label cardinality bounded
    let path = req
        .match_pattern()
        .unwrap_or_else(|| "unmatched".to_string());
    let method = req.method().to_string();
    let start = Instant::now();

    let result = next.call(req).await;
    let status = match &result {
        Ok(response) => response.status().as_u16(),
        Err(_) => 500,
    };
    observe_http_request(&method, &path, status, start.elapsed());

    result
}

pub async fn serve_metrics() -> HttpResponse {
    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();

    let mut buffer = Vec::new();
    if let Err(err) = encoder.encode(&metric_families, &mut buffer) {
        return HttpResponse::InternalServerError().body(err.to_string());
    }

    HttpResponse::Ok()
        .content_type(encoder.format_type())
        .body(buffer)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_outcome_increments() {
        let before = outcome_count("skipped");
        record_outcome(&RelayOutcome::Skipped);
        assert!(outcome_count("skipped") > before);
    }

    #[actix_web::test]
    async fn test_serve_metrics_exposes_relay_counter() {
        record_outcome(&RelayOutcome::Failed {
            error: "boom".to_string(),
        });

        let response = serve_metrics().await;
        assert!(response.status().is_success());

        let body = actix_web::body::to_bytes(response.into_body()).await.unwrap();
        let text = String::from_utf8(body.to_vec()).unwrap();
        assert!(text.contains("push_relay_events_total"));
    }
}
