//! Upstream forwarding.
//!
//! # Responsibilities
//! - Build the outbound request: composed URI, filtered headers, body
//! - Send it through the shared HTTP client
//! - Classify the result for the breaker and prepare the relay response
//!
//! # Design Decisions
//! - Status >= 500 is an error: repeated upstream server errors must trip the
//!   breaker just like connection failures; the 5xx body is discarded
//! - Status < 500 (4xx included) is a success and relayed unchanged
//! - `Host` is never forwarded (the client derives it from the upstream URI)
//! - Bodies are buffered on both legs, so framing headers (`Content-Length`,
//!   `Transfer-Encoding`) are dropped and re-derived from the buffered body
//! - JSON responses are checked for well-formedness and relayed byte for
//!   byte; anything else is relayed as raw bytes

use std::future::Future;
use std::sync::Arc;

use axum::body::{Body, Bytes};
use axum::http::{header, HeaderMap, HeaderName, HeaderValue, Request, StatusCode};
use axum::response::{IntoResponse, Response};
use hyper_util::client::legacy::{connect::HttpConnector, Client};
use serde::de::IgnoredAny;
use thiserror::Error;

use crate::http::body::{collect_limited, BodyError};
use crate::http::request::InboundRequest;
use crate::resilience::Action;
use crate::routing::ServiceRoute;

/// Shared upstream HTTP client.
pub type UpstreamClient = Client<HttpConnector, Body>;

/// Request headers never copied upstream.
const SKIP_REQUEST_HEADERS: [HeaderName; 3] = [
    header::HOST,
    header::CONTENT_LENGTH,
    header::TRANSFER_ENCODING,
];

/// Response headers never copied back to the caller.
const SKIP_RESPONSE_HEADERS: [HeaderName; 2] = [header::TRANSFER_ENCODING, header::CONTENT_LENGTH];

/// Failure of one forwarding attempt.
#[derive(Debug, Error)]
pub enum UpstreamError {
    #[error("path '{0}' is outside the route prefix")]
    Unroutable(String),

    #[error("invalid upstream uri: {0}")]
    InvalidUri(#[from] axum::http::uri::InvalidUri),

    #[error("failed to build upstream request: {0}")]
    Request(#[from] axum::http::Error),

    #[error("upstream unreachable: {0}")]
    Connect(#[from] hyper_util::client::legacy::Error),

    #[error("upstream body: {0}")]
    Body(#[from] BodyError),

    #[error("upstream sent invalid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("upstream responded {0}")]
    Status(StatusCode),
}

/// Body relayed back to the caller.
#[derive(Debug, Clone, PartialEq)]
pub enum RelayBody {
    /// Upstream bytes known to parse as JSON.
    Json(Bytes),
    Raw(Bytes),
}

/// Upstream response ready to hand back to the caller.
#[derive(Debug, Clone)]
pub struct RelayedResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: RelayBody,
}

impl IntoResponse for RelayedResponse {
    fn into_response(self) -> Response {
        let body = match self.body {
            RelayBody::Json(bytes) | RelayBody::Raw(bytes) => bytes,
        };
        let mut response = Response::new(Body::from(body));
        *response.status_mut() = self.status;
        *response.headers_mut() = self.headers;
        response
    }
}

/// Forwards requests for one service route.
#[derive(Clone)]
pub struct ForwardingAction {
    route: Arc<ServiceRoute>,
    client: UpstreamClient,
    max_response_body: usize,
}

impl ForwardingAction {
    pub fn new(route: Arc<ServiceRoute>, client: UpstreamClient, max_response_body: usize) -> Self {
        Self {
            route,
            client,
            max_response_body,
        }
    }

    /// Forward one request and classify the upstream answer.
    pub async fn forward(&self, inbound: InboundRequest) -> Result<RelayedResponse, UpstreamError> {
        let uri = self
            .route
            .upstream_uri(&inbound.uri)
            .ok_or_else(|| UpstreamError::Unroutable(inbound.uri.path().to_string()))??;

        tracing::debug!(
            service = %self.route.service_name(),
            request_id = %inbound.request_id(),
            method = %inbound.method,
            upstream = %uri,
            "Forwarding request"
        );

        let request = build_upstream_request(inbound, uri)?;
        let response = self.client.request(request).await?;

        let status = response.status();
        if status.is_server_error() {
            return Err(UpstreamError::Status(status));
        }

        let (parts, body) = response.into_parts();
        let bytes = collect_limited(body, self.max_response_body).await?;
        let body = if is_json(&parts.headers) && !bytes.is_empty() {
            serde_json::from_slice::<IgnoredAny>(&bytes)?;
            RelayBody::Json(bytes)
        } else {
            RelayBody::Raw(bytes)
        };

        Ok(RelayedResponse {
            status,
            headers: relay_headers(&parts.headers),
            body,
        })
    }
}

impl Action for ForwardingAction {
    type Input = InboundRequest;
    type Output = RelayedResponse;
    type Error = UpstreamError;

    fn call(
        &self,
        input: InboundRequest,
    ) -> impl Future<Output = Result<RelayedResponse, UpstreamError>> + Send {
        self.forward(input)
    }
}

fn build_upstream_request(
    inbound: InboundRequest,
    uri: axum::http::Uri,
) -> Result<Request<Body>, UpstreamError> {
    let carries_body = inbound.carries_body();
    let headers = outbound_headers(&inbound.headers, carries_body);
    let body = if carries_body {
        Body::from(inbound.body)
    } else {
        Body::empty()
    };

    let mut request = Request::builder().method(inbound.method).uri(uri).body(body)?;
    *request.headers_mut() = headers;
    Ok(request)
}

/// Inbound headers minus `Host` and framing; JSON content type when a body
/// travels without one.
pub fn outbound_headers(inbound: &HeaderMap, carries_body: bool) -> HeaderMap {
    let mut headers = HeaderMap::with_capacity(inbound.len() + 1);
    for (name, value) in inbound {
        if SKIP_REQUEST_HEADERS.contains(name) {
            continue;
        }
        headers.append(name.clone(), value.clone());
    }
    if carries_body && !headers.contains_key(header::CONTENT_TYPE) {
        headers.insert(
            header::CONTENT_TYPE,
            HeaderValue::from_static("application/json"),
        );
    }
    headers
}

/// Upstream headers minus `Transfer-Encoding` and `Content-Length`.
pub fn relay_headers(upstream: &HeaderMap) -> HeaderMap {
    let mut headers = HeaderMap::with_capacity(upstream.len());
    for (name, value) in upstream {
        if SKIP_RESPONSE_HEADERS.contains(name) {
            continue;
        }
        headers.append(name.clone(), value.clone());
    }
    headers
}

fn is_json(headers: &HeaderMap) -> bool {
    headers
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|ct| ct.to_ascii_lowercase().contains("application/json"))
}
