//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! Breakers and handlers produce:
//!     → logging.rs (structured log events)
//!     → metrics.rs (counters, gauges, histograms)
//!     → breaker_events.rs (breaker observers bridging into both)
//!
//! Consumers:
//!     → Log aggregation (stdout)
//!     → Metrics endpoint (Prometheus scrape)
//! ```
//!
//! # Design Decisions
//! - Structured logging (JSON) for machine parsing
//! - Request ID flows through every log line of a request via the trace span

pub mod breaker_events;
pub mod logging;
pub mod metrics;

pub use breaker_events::{LogObserver, MetricsObserver};
pub use logging::init_logging;
