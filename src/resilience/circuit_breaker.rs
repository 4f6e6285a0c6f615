//! Circuit breaker for upstream protection.
//!
//! # States
//! - Closed: normal operation, calls pass through
//! - Open: upstream assumed down, calls fail fast
//! - Half-Open: a single probe call tests whether the upstream recovered
//!
//! # State Transitions
//! ```text
//! Closed → Open: volume >= volume_threshold AND error% >= threshold (rolling window)
//! Open → Half-Open: reset_timeout elapsed since opened_at (evaluated lazily)
//! Half-Open → Closed: probe succeeds (window cleared)
//! Half-Open → Open: probe fails or times out (opened_at = now)
//! ```
//!
//! # Design Decisions
//! - One breaker per service, each wrapping exactly one `Action`
//! - The mutex guards counters and state only; it is never held across the
//!   wrapped call
//! - The timeout drops the action future: cancellation is cooperative, the
//!   classification happens at the deadline regardless
//! - Only the admitted probe may resolve Half-Open; late results from calls
//!   admitted earlier just land in the window

use std::future::Future;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use serde::Serialize;
use thiserror::Error;
use tokio::time::Instant;

use crate::resilience::events::{BreakerEvent, BreakerObserver};
use crate::resilience::rolling::{RollingWindow, Sample, WindowCounts};

/// Unit of work protected by a breaker.
pub trait Action: Send + Sync + 'static {
    type Input: Send + 'static;
    type Output: Send + 'static;
    type Error: std::error::Error + Send + Sync + 'static;

    fn call(
        &self,
        input: Self::Input,
    ) -> impl Future<Output = Result<Self::Output, Self::Error>> + Send;
}

/// Breaker state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CircuitState {
    Closed,
    Open,
    HalfOpen,
}

impl CircuitState {
    /// Numeric encoding for gauges (0 closed, 1 half-open, 2 open).
    pub fn as_gauge(self) -> f64 {
        match self {
            CircuitState::Closed => 0.0,
            CircuitState::HalfOpen => 1.0,
            CircuitState::Open => 2.0,
        }
    }
}

/// Fixed parameters of a breaker.
#[derive(Debug, Clone, PartialEq)]
pub struct BreakerPolicy {
    /// Deadline for one call of the wrapped action.
    pub timeout: Duration,
    /// Failure-or-timeout percentage that trips the breaker.
    pub error_threshold_percentage: f64,
    /// Length of the statistics window.
    pub rolling_window: Duration,
    /// Number of buckets the window is split into.
    pub bucket_count: usize,
    /// Time spent Open before a probe is allowed.
    pub reset_timeout: Duration,
    /// Minimum samples in the window before the ratio is evaluated.
    pub volume_threshold: u64,
}

impl Default for BreakerPolicy {
    fn default() -> Self {
        Self {
            timeout: Duration::from_millis(3000),
            error_threshold_percentage: 50.0,
            rolling_window: Duration::from_millis(10_000),
            bucket_count: 10,
            reset_timeout: Duration::from_millis(10_000),
            volume_threshold: 5,
        }
    }
}

/// Why a fire did not produce an output.
#[derive(Debug, Error)]
pub enum BreakerError<E>
where
    E: std::error::Error + 'static,
{
    #[error("circuit for '{service}' is open")]
    Open { service: String },

    #[error("call to '{service}' timed out after {timeout:?}")]
    Timeout { service: String, timeout: Duration },

    #[error("call to '{service}' failed: {source}")]
    Execution {
        service: String,
        #[source]
        source: E,
    },
}

impl<E: std::error::Error + 'static> BreakerError<E> {
    pub fn is_open(&self) -> bool {
        matches!(self, BreakerError::Open { .. })
    }
}

/// Rolling statistics exposed in snapshots.
#[derive(Debug, Clone, Serialize)]
pub struct BreakerStats {
    #[serde(flatten)]
    pub counts: WindowCounts,
    pub error_percentage: f64,
    pub probe_in_flight: bool,
}

/// Read-only projection of one breaker.
#[derive(Debug, Clone, Serialize)]
pub struct BreakerSnapshot {
    #[serde(skip_serializing)]
    pub service: String,
    pub state: CircuitState,
    pub stats: BreakerStats,
}

#[derive(Debug)]
struct BreakerInner {
    state: CircuitState,
    opened_at: Option<Instant>,
    probe_in_flight: bool,
    window: RollingWindow,
}

impl BreakerInner {
    fn transition(&mut self, to: CircuitState, now: Instant, events: &mut Vec<BreakerEvent>) {
        let from = self.state;
        if from == to {
            return;
        }
        self.state = to;
        self.opened_at = (to == CircuitState::Open).then_some(now);
        if from == CircuitState::HalfOpen {
            self.probe_in_flight = false;
        }
        if to == CircuitState::Closed {
            self.window.reset();
        }
        events.push(BreakerEvent::StateChanged { from, to });
    }

    fn reset_elapsed(&self, now: Instant, reset_timeout: Duration) -> bool {
        self.opened_at
            .is_some_and(|at| now.saturating_duration_since(at) >= reset_timeout)
    }
}

enum Admission {
    Call,
    Probe,
    Reject,
}

enum Outcome {
    Success,
    Failure(String),
    Timeout,
}

/// Releases the Half-Open probe slot if the probing fire is dropped mid-call.
struct ProbeSlot<'a> {
    inner: &'a Mutex<BreakerInner>,
    armed: bool,
}

impl Drop for ProbeSlot<'_> {
    fn drop(&mut self) {
        if self.armed {
            let mut inner = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
            inner.probe_in_flight = false;
        }
    }
}

/// Circuit breaker wrapping one action.
pub struct CircuitBreaker<A: Action> {
    name: String,
    policy: BreakerPolicy,
    action: A,
    inner: Mutex<BreakerInner>,
    observer: Arc<dyn BreakerObserver>,
}

impl<A: Action> CircuitBreaker<A> {
    /// Create a closed breaker.
    pub fn new(
        name: impl Into<String>,
        action: A,
        policy: BreakerPolicy,
        observer: Arc<dyn BreakerObserver>,
    ) -> Self {
        let window = RollingWindow::new(policy.rolling_window, policy.bucket_count);
        Self {
            name: name.into(),
            policy,
            action,
            inner: Mutex::new(BreakerInner {
                state: CircuitState::Closed,
                opened_at: None,
                probe_in_flight: false,
                window,
            }),
            observer,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Current state as a caller would observe it on the next fire.
    ///
    /// An Open breaker past its reset timeout reports Half-Open; the stored
    /// state is not touched.
    pub fn state(&self) -> CircuitState {
        let inner = self.lock();
        self.effective_state(&inner, Instant::now())
    }

    /// Pure read of state and window totals.
    pub fn snapshot(&self) -> BreakerSnapshot {
        let now = Instant::now();
        let inner = self.lock();
        let counts = inner.window.totals(now);
        BreakerSnapshot {
            service: self.name.clone(),
            state: self.effective_state(&inner, now),
            stats: BreakerStats {
                counts,
                error_percentage: counts.error_percentage(),
                probe_in_flight: inner.probe_in_flight,
            },
        }
    }

    /// Run the action through the breaker.
    pub async fn fire(&self, input: A::Input) -> Result<A::Output, BreakerError<A::Error>> {
        let probe = match self.admit() {
            Admission::Reject => {
                return Err(BreakerError::Open {
                    service: self.name.clone(),
                })
            }
            Admission::Call => false,
            Admission::Probe => true,
        };

        let mut slot = ProbeSlot {
            inner: &self.inner,
            armed: probe,
        };
        let result = tokio::time::timeout(self.policy.timeout, self.action.call(input)).await;
        slot.armed = false;

        match result {
            Ok(Ok(output)) => {
                self.complete(probe, Outcome::Success);
                Ok(output)
            }
            Ok(Err(source)) => {
                self.complete(probe, Outcome::Failure(source.to_string()));
                Err(BreakerError::Execution {
                    service: self.name.clone(),
                    source,
                })
            }
            Err(_) => {
                self.complete(probe, Outcome::Timeout);
                Err(BreakerError::Timeout {
                    service: self.name.clone(),
                    timeout: self.policy.timeout,
                })
            }
        }
    }

    fn admit(&self) -> Admission {
        let now = Instant::now();
        let mut events = Vec::new();
        let admission = {
            let mut inner = self.lock();
            if inner.state == CircuitState::Open
                && inner.reset_elapsed(now, self.policy.reset_timeout)
            {
                inner.transition(CircuitState::HalfOpen, now, &mut events);
            }
            match inner.state {
                CircuitState::Closed => Admission::Call,
                CircuitState::HalfOpen if !inner.probe_in_flight => {
                    inner.probe_in_flight = true;
                    Admission::Probe
                }
                _ => {
                    inner.window.record(Sample::Rejection, now);
                    events.push(BreakerEvent::Rejected);
                    Admission::Reject
                }
            }
        };
        self.emit(&events);
        admission
    }

    fn complete(&self, probe: bool, outcome: Outcome) {
        let now = Instant::now();
        let (sample, event) = match outcome {
            Outcome::Success => (Sample::Success, BreakerEvent::Success),
            Outcome::Failure(reason) => (Sample::Failure, BreakerEvent::Failure { reason }),
            Outcome::Timeout => (Sample::Timeout, BreakerEvent::Timeout),
        };

        let mut events = vec![event];
        {
            let mut inner = self.lock();
            if probe && inner.state == CircuitState::HalfOpen {
                if sample == Sample::Success {
                    inner.transition(CircuitState::Closed, now, &mut events);
                    inner.window.record(sample, now);
                } else {
                    inner.window.record(sample, now);
                    inner.transition(CircuitState::Open, now, &mut events);
                }
            } else {
                inner.window.record(sample, now);
                if inner.state == CircuitState::Closed && self.should_trip(&inner, now) {
                    inner.transition(CircuitState::Open, now, &mut events);
                }
            }
        }
        self.emit(&events);
    }

    fn should_trip(&self, inner: &BreakerInner, now: Instant) -> bool {
        let counts = inner.window.totals(now);
        counts.volume() >= self.policy.volume_threshold
            && counts.error_percentage() >= self.policy.error_threshold_percentage
    }

    fn effective_state(&self, inner: &BreakerInner, now: Instant) -> CircuitState {
        if inner.state == CircuitState::Open && inner.reset_elapsed(now, self.policy.reset_timeout) {
            CircuitState::HalfOpen
        } else {
            inner.state
        }
    }

    fn emit(&self, events: &[BreakerEvent]) {
        for event in events {
            self.observer.on_event(&self.name, event);
        }
    }

    fn lock(&self) -> MutexGuard<'_, BreakerInner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl<A: Action> std::fmt::Debug for CircuitBreaker<A> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CircuitBreaker")
            .field("name", &self.name)
            .field("policy", &self.policy)
            .field("state", &self.state())
            .finish()
    }
}
