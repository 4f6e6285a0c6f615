//! Resilience subsystem.
//!
//! # Data Flow
//! ```text
//! Request for service S:
//!     → registry.rs (breaker for S, created on first use)
//!     → circuit_breaker.rs (admit / short-circuit / probe, enforce timeout)
//!     → rolling.rs (fold the classified outcome into the window)
//!     → events.rs (notify observers of outcome and transitions)
//! ```
//!
//! # Design Decisions
//! - Timeouts are non-negotiable; every protected call has a deadline
//! - Breakers are per service, never global
//! - Observers are decoupled from any logging or metrics sink

pub mod circuit_breaker;
pub mod events;
pub mod registry;
pub mod rolling;

pub use circuit_breaker::{
    Action, BreakerError, BreakerPolicy, BreakerSnapshot, BreakerStats, CircuitBreaker,
    CircuitState,
};
pub use events::{BreakerEvent, BreakerObserver, NoopObserver, ObserverChain};
pub use registry::{BreakerInspector, BreakerRegistry};
pub use rolling::WindowCounts;
