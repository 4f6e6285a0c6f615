//! Breaker event notification.
//!
//! Breakers report every state change and classified call to a
//! `BreakerObserver`. Observers run synchronously on the calling task,
//! after the breaker has released its lock, so they may read breaker state
//! but must not block.

use std::fmt;
use std::sync::Arc;

use crate::resilience::circuit_breaker::CircuitState;

/// Something that happened to a breaker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BreakerEvent {
    /// State transition.
    StateChanged { from: CircuitState, to: CircuitState },
    /// Call short-circuited while open (or while a probe was in flight).
    Rejected,
    /// Action exceeded the breaker timeout.
    Timeout,
    /// Action returned an error.
    Failure { reason: String },
    /// Action completed normally.
    Success,
}

impl BreakerEvent {
    /// Stable label used in logs and metrics.
    pub fn label(&self) -> &'static str {
        match self {
            BreakerEvent::StateChanged { to, .. } => match to {
                CircuitState::Closed => "close",
                CircuitState::Open => "open",
                CircuitState::HalfOpen => "half_open",
            },
            BreakerEvent::Rejected => "reject",
            BreakerEvent::Timeout => "timeout",
            BreakerEvent::Failure { .. } => "failure",
            BreakerEvent::Success => "success",
        }
    }
}

/// Receives breaker events.
pub trait BreakerObserver: Send + Sync {
    fn on_event(&self, service: &str, event: &BreakerEvent);
}

impl<F> BreakerObserver for F
where
    F: Fn(&str, &BreakerEvent) + Send + Sync,
{
    fn on_event(&self, service: &str, event: &BreakerEvent) {
        self(service, event)
    }
}

/// Observer that discards everything.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopObserver;

impl BreakerObserver for NoopObserver {
    fn on_event(&self, _service: &str, _event: &BreakerEvent) {}
}

/// Fans one event out to several observers in order.
#[derive(Clone, Default)]
pub struct ObserverChain {
    observers: Vec<Arc<dyn BreakerObserver>>,
}

impl ObserverChain {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, observer: Arc<dyn BreakerObserver>) -> Self {
        self.observers.push(observer);
        self
    }
}

impl BreakerObserver for ObserverChain {
    fn on_event(&self, service: &str, event: &BreakerEvent) {
        for observer in &self.observers {
            observer.on_event(service, event);
        }
    }
}

impl fmt::Debug for ObserverChain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ObserverChain")
            .field("observers", &self.observers.len())
            .finish()
    }
}
