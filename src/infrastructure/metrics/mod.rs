//! Prometheus Metrics Module
//!
//! Provides application-wide metrics collection using Prometheus.
//!
//! # Metrics Collected
//! - HTTP request counts by method, path, and status
//! - HTTP request latency histograms
//! - Active WebSocket connection and online identity gauges
//! - Realtime events emitted, by event name
//! - Client intents handled, by intent name and outcome
//! - Flat-file store write latency, by collection

use once_cell::sync::Lazy;
use prometheus::{
    Encoder, HistogramOpts, HistogramVec, IntCounterVec, IntGauge, Opts, Registry, TextEncoder,
};

/// Global metrics registry
pub static REGISTRY: Lazy<Registry> = Lazy::new(|| {
    let registry = Registry::new();
    register_metrics(&registry);
    registry
});

/// HTTP request counter - tracks total requests by method, path, and status code
pub static HTTP_REQUESTS_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("http_requests_total", "Total number of HTTP requests").namespace("chat_relay"),
        &["method", "path", "status"],
    )
    .expect("Failed to create HTTP_REQUESTS_TOTAL metric")
});

/// HTTP request latency histogram - tracks request duration in seconds
pub static HTTP_REQUEST_DURATION_SECONDS: Lazy<HistogramVec> = Lazy::new(|| {
    let buckets = vec![0.001, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0];
    HistogramVec::new(
        HistogramOpts::new(
            "http_request_duration_seconds",
            "HTTP request latency in seconds",
        )
        .namespace("chat_relay")
        .buckets(buckets),
        &["method", "path"],
    )
    .expect("Failed to create HTTP_REQUEST_DURATION_SECONDS metric")
});

/// Live WebSocket connections
pub static WEBSOCKET_CONNECTIONS_ACTIVE: Lazy<IntGauge> = Lazy::new(|| {
    IntGauge::with_opts(
        Opts::new(
            "websocket_connections_active",
            "Number of active WebSocket connections",
        )
        .namespace("chat_relay"),
    )
    .expect("Failed to create WEBSOCKET_CONNECTIONS_ACTIVE metric")
});

/// Identities with at least one live connection
pub static ONLINE_IDENTITIES: Lazy<IntGauge> = Lazy::new(|| {
    IntGauge::with_opts(
        Opts::new("online_identities", "Number of identities currently online")
            .namespace("chat_relay"),
    )
    .expect("Failed to create ONLINE_IDENTITIES metric")
});

/// Server events delivered to connection queues
pub static REALTIME_EVENTS_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("realtime_events_total", "Realtime events emitted to connections")
            .namespace("chat_relay"),
        &["event"],
    )
    .expect("Failed to create REALTIME_EVENTS_TOTAL metric")
});

/// Client intents handled
pub static INTENTS_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("intents_total", "Client intents handled").namespace("chat_relay"),
        &["intent", "outcome"], // "ok", "rejected", "failed"
    )
    .expect("Failed to create INTENTS_TOTAL metric")
});

/// Flat-file store write duration histogram
pub static STORE_WRITE_DURATION_SECONDS: Lazy<HistogramVec> = Lazy::new(|| {
    let buckets = vec![0.0005, 0.001, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0];
    HistogramVec::new(
        HistogramOpts::new(
            "store_write_duration_seconds",
            "Flat-file collection write latency in seconds",
        )
        .namespace("chat_relay")
        .buckets(buckets),
        &["collection"],
    )
    .expect("Failed to create STORE_WRITE_DURATION_SECONDS metric")
});

/// Register all metrics with the registry
fn register_metrics(registry: &Registry) {
    registry
        .register(Box::new(HTTP_REQUESTS_TOTAL.clone()))
        .expect("Failed to register HTTP_REQUESTS_TOTAL");
    registry
        .register(Box::new(HTTP_REQUEST_DURATION_SECONDS.clone()))
        .expect("Failed to register HTTP_REQUEST_DURATION_SECONDS");
    registry
        .register(Box::new(WEBSOCKET_CONNECTIONS_ACTIVE.clone()))
        .expect("Failed to register WEBSOCKET_CONNECTIONS_ACTIVE");
    registry
        .register(Box::new(ONLINE_IDENTITIES.clone()))
        .expect("Failed to register ONLINE_IDENTITIES");
    registry
        .register(Box::new(REALTIME_EVENTS_TOTAL.clone()))
        .expect("Failed to register REALTIME_EVENTS_TOTAL");
    registry
        .register(Box::new(INTENTS_TOTAL.clone()))
        .expect("Failed to register INTENTS_TOTAL");
    registry
        .register(Box::new(STORE_WRITE_DURATION_SECONDS.clone()))
        .expect("Failed to register STORE_WRITE_DURATION_SECONDS");
}

/// Collect and encode all metrics as Prometheus text format
pub fn gather_metrics() -> String {
    let encoder = TextEncoder::new();
    let metric_families = REGISTRY.gather();
    let mut buffer = Vec::new();
    if let Err(e) = encoder.encode(&metric_families, &mut buffer) {
        tracing::error!(error = %e, "Failed to encode metrics");
        return String::new();
    }
    String::from_utf8(buffer).unwrap_or_default()
}

/// Helper to record HTTP request metrics
pub fn record_http_request(method: &str, path: &str, status: u16, duration_secs: f64) {
    let status = status.to_string();
    HTTP_REQUESTS_TOTAL
        .with_label_values(&[method, path, status.as_str()])
        .inc();
    HTTP_REQUEST_DURATION_SECONDS
        .with_label_values(&[method, path])
        .observe(duration_secs);
}

/// Helper to record flat-file store writes
pub fn record_store_write(collection: &str, duration_secs: f64) {
    STORE_WRITE_DURATION_SECONDS
        .with_label_values(&[collection])
        .observe(duration_secs);
}

/// Helper to count an emitted realtime event
pub fn record_event(event: &str) {
    REALTIME_EVENTS_TOTAL.with_label_values(&[event]).inc();
}

/// Helper to count a handled intent
pub fn record_intent(intent: &str, outcome: &str) {
    INTENTS_TOTAL.with_label_values(&[intent, outcome]).inc();
}

/// Helper to update connection and presence gauges
pub fn set_realtime_gauges(connections: usize, online: usize) {
    WEBSOCKET_CONNECTIONS_ACTIVE.set(connections as i64);
    ONLINE_IDENTITIES.set(online as i64);
}
