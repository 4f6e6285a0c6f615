//! Metrics collection and exposition.
//!
//! # Metrics
//! - `gateway_requests_total` (counter): requests by service, status
//! - `gateway_request_duration_seconds` (histogram): latency by service
//! - `gateway_breaker_events_total` (counter): breaker events by service, event
//! - `gateway_breaker_state` (gauge): 0=closed, 1=half-open, 2=open
//!
//! # Design Decisions
//! - Recording is a no-op until a recorder is installed, so tests and
//!   metrics-disabled deployments pay nothing
//! - Prometheus exposition runs on its own listener, away from proxied traffic

use std::net::SocketAddr;
use std::time::Instant;

use metrics_exporter_prometheus::{BuildError, PrometheusBuilder};

use crate::resilience::CircuitState;

/// Install the Prometheus recorder and its scrape listener on `addr`.
pub fn init_metrics(addr: SocketAddr) -> Result<(), BuildError> {
    PrometheusBuilder::new().with_http_listener(addr).install()?;
    tracing::info!(address = %addr, "Metrics endpoint listening");
    Ok(())
}

/// Record one finished gateway request.
pub fn record_request(service: &str, status: u16, started: Instant) {
    metrics::counter!(
        "gateway_requests_total",
        "service" => service.to_string(),
        "status" => status.to_string()
    )
    .increment(1);
    metrics::histogram!(
        "gateway_request_duration_seconds",
        "service" => service.to_string()
    )
    .record(started.elapsed().as_secs_f64());
}

/// Count a breaker event.
pub fn record_breaker_event(service: &str, event: &'static str) {
    metrics::counter!(
        "gateway_breaker_events_total",
        "service" => service.to_string(),
        "event" => event
    )
    .increment(1);
}

/// Publish the current breaker state.
pub fn record_breaker_state(service: &str, state: CircuitState) {
    metrics::gauge!("gateway_breaker_state", "service" => service.to_string())
        .set(state.as_gauge());
}
