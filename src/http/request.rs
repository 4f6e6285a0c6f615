//! Inbound request descriptor.
//!
//! # Responsibilities
//! - Buffer the inbound body up to the configured limit
//! - Capture method, URI and headers for the forwarding action
//!
//! # Design Decisions
//! - Body buffered before the breaker is consulted: an oversized or broken
//!   client body is the caller's fault and never counts against the upstream
//! - Declared `Content-Length` above the limit is rejected without reading
//! - Request IDs are UUID v4, assigned only when the caller sent none

use axum::body::{Body, Bytes};
use axum::http::{header, HeaderMap, HeaderValue, Method, Request, Uri};
use tower_http::request_id::{MakeRequestId, RequestId};
use uuid::Uuid;

use crate::http::body::{collect_limited, BodyError};

/// Header carrying the per-request correlation ID.
pub const X_REQUEST_ID: &str = "x-request-id";

/// Generates UUID v4 request IDs for `SetRequestIdLayer`.
#[derive(Debug, Clone, Copy, Default)]
pub struct UuidRequestId;

impl MakeRequestId for UuidRequestId {
    fn make_request_id<B>(&mut self, _request: &Request<B>) -> Option<RequestId> {
        HeaderValue::from_str(&Uuid::new_v4().to_string())
            .ok()
            .map(RequestId::new)
    }
}

/// Everything the forwarding action needs from one inbound request.
#[derive(Debug, Clone)]
pub struct InboundRequest {
    pub method: Method,
    pub uri: Uri,
    pub headers: HeaderMap,
    pub body: Bytes,
}

impl InboundRequest {
    /// Buffer `request`, enforcing `limit` bytes of body.
    pub async fn from_request(request: Request<Body>, limit: usize) -> Result<Self, BodyError> {
        let (parts, body) = request.into_parts();

        let declared = parts
            .headers
            .get(header::CONTENT_LENGTH)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.parse::<usize>().ok());
        if declared.is_some_and(|len| len > limit) {
            return Err(BodyError::TooLarge { limit });
        }

        let body = collect_limited(body, limit).await?;

        Ok(Self {
            method: parts.method,
            uri: parts.uri,
            headers: parts.headers,
            body,
        })
    }

    /// True when a body should be forwarded upstream.
    pub fn carries_body(&self) -> bool {
        self.method != Method::GET && self.method != Method::HEAD && !self.body.is_empty()
    }

    /// Correlation ID assigned by the request-id layer.
    pub fn request_id(&self) -> &str {
        self.headers
            .get(X_REQUEST_ID)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("unknown")
    }
}
