//! Routing subsystem.
//!
//! # Data Flow
//! ```text
//! Route Compilation (at startup):
//!     GatewayConfig.services
//!     → router.rs (skip empty, derive base path and external prefix)
//!     → route.rs (ServiceRoute, immutable)
//!     → one axum handler per route
//!
//! Per request:
//!     inbound path
//!     → route.rs (strip external prefix, compose upstream URI)
//! ```
//!
//! # Design Decisions
//! - Routes compiled at startup, immutable at runtime
//! - No regex in hot path (prefix matching only)
//! - Deterministic: same input always matches same route

pub mod route;
pub mod router;

pub use route::ServiceRoute;
pub use router::RouteTable;
