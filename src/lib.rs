//! Circuit-breaking API gateway library.

// Core subsystems
pub mod config;
pub mod http;
pub mod routing;

// Fault isolation
pub mod resilience;

// Cross-cutting concerns
pub mod admin;
pub mod lifecycle;
pub mod observability;

pub use config::GatewayConfig;
pub use http::GatewayServer;
pub use lifecycle::Shutdown;
pub use resilience::{BreakerRegistry, CircuitBreaker, CircuitState};
