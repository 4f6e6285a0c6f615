//! Breaker observers that feed logs and metrics.

use crate::observability::metrics;
use crate::resilience::{BreakerEvent, BreakerObserver, CircuitState};

/// Logs breaker events.
///
/// Trips, probes, rejections and failed calls are warnings; a breaker
/// closing again is info; successes only show at debug.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogObserver;

impl BreakerObserver for LogObserver {
    fn on_event(&self, service: &str, event: &BreakerEvent) {
        match event {
            BreakerEvent::StateChanged {
                from,
                to: CircuitState::Closed,
            } => {
                tracing::info!(service = %service, from = ?from, "Circuit closed");
            }
            BreakerEvent::StateChanged {
                from,
                to: CircuitState::Open,
            } => {
                tracing::warn!(service = %service, from = ?from, "Circuit opened");
            }
            BreakerEvent::StateChanged {
                from,
                to: CircuitState::HalfOpen,
            } => {
                tracing::warn!(service = %service, from = ?from, "Circuit half-open, probing");
            }
            BreakerEvent::Rejected => {
                tracing::warn!(service = %service, "Request rejected by open circuit");
            }
            BreakerEvent::Timeout => {
                tracing::warn!(service = %service, "Upstream call timed out");
            }
            BreakerEvent::Failure { reason } => {
                tracing::warn!(service = %service, reason = %reason, "Upstream call failed");
            }
            BreakerEvent::Success => {
                tracing::debug!(service = %service, "Upstream call succeeded");
            }
        }
    }
}

/// Counts breaker events and tracks the state gauge.
#[derive(Debug, Clone, Copy, Default)]
pub struct MetricsObserver;

impl BreakerObserver for MetricsObserver {
    fn on_event(&self, service: &str, event: &BreakerEvent) {
        metrics::record_breaker_event(service, event.label());
        if let BreakerEvent::StateChanged { to, .. } = event {
            metrics::record_breaker_state(service, *to);
        }
    }
}
