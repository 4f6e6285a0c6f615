//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, request ID and trace layers)
//!     → gateway.rs (service handler, breaker fire)
//!     → request.rs (buffer body, capture request parts)
//!     → forward.rs (compose upstream URI, call, classify)
//!     → response.rs (gateway-originated JSON errors)
//!     → Send to client
//! ```

pub mod body;
pub mod forward;
pub mod gateway;
pub mod request;
pub mod response;
pub mod server;

pub use forward::{ForwardingAction, RelayBody, RelayedResponse, UpstreamClient, UpstreamError};
pub use gateway::{ForwardingRegistry, ProxyGateway, ServiceHandler};
pub use request::{InboundRequest, UuidRequestId, X_REQUEST_ID};
pub use response::GatewayError;
pub use server::GatewayServer;
