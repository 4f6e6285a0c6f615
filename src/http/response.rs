//! Gateway-generated responses.
//!
//! # Responsibilities
//! - Map breaker and body failures to JSON error responses
//! - Answer unmatched paths
//!
//! # Design Decisions
//! - Every gateway-originated error body is JSON and names the service
//! - Open circuit is 503; every other upstream failure (timeout, transport,
//!   5xx, bad JSON) collapses to 502

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

use crate::http::body::BodyError;
use crate::http::forward::UpstreamError;
use crate::resilience::BreakerError;

/// JSON error body returned by the gateway itself.
#[derive(Debug, Clone, Serialize)]
pub struct GatewayErrorBody {
    pub error: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub service: Option<String>,
}

/// A failure answered by the gateway instead of the upstream.
#[derive(Debug, Clone)]
pub struct GatewayError {
    status: StatusCode,
    body: GatewayErrorBody,
}

impl GatewayError {
    fn new(status: StatusCode, error: &'static str, service: Option<&str>) -> Self {
        Self {
            status,
            body: GatewayErrorBody {
                error,
                service: service.map(str::to_string),
            },
        }
    }

    pub fn circuit_open(service: &str) -> Self {
        Self::new(
            StatusCode::SERVICE_UNAVAILABLE,
            "Service temporarily unavailable (circuit open)",
            Some(service),
        )
    }

    pub fn bad_gateway(service: &str) -> Self {
        Self::new(
            StatusCode::BAD_GATEWAY,
            "Bad gateway (upstream failure)",
            Some(service),
        )
    }

    pub fn payload_too_large(service: &str) -> Self {
        Self::new(StatusCode::PAYLOAD_TOO_LARGE, "Payload too large", Some(service))
    }

    pub fn unreadable_body(service: &str) -> Self {
        Self::new(
            StatusCode::BAD_REQUEST,
            "Failed to read request body",
            Some(service),
        )
    }

    pub fn not_found() -> Self {
        Self::new(StatusCode::NOT_FOUND, "No matching route found", None)
    }

    /// Response for a breaker outcome other than success.
    pub fn from_breaker(service: &str, err: &BreakerError<UpstreamError>) -> Self {
        if err.is_open() {
            Self::circuit_open(service)
        } else {
            Self::bad_gateway(service)
        }
    }

    /// Response for an inbound body that could not be buffered.
    pub fn from_body(service: &str, err: &BodyError) -> Self {
        match err {
            BodyError::TooLarge { .. } => Self::payload_too_large(service),
            BodyError::Read(_) => Self::unreadable_body(service),
        }
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }
}

impl IntoResponse for GatewayError {
    fn into_response(self) -> Response {
        (self.status, Json(self.body)).into_response()
    }
}

/// Fallback handler for paths no service claims.
pub async fn not_found() -> GatewayError {
    GatewayError::not_found()
}
