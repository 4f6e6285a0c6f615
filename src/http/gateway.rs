//! Proxy gateway.
//!
//! # Responsibilities
//! - Bind one request handler per configured service
//! - Run every forwarded request through that service's breaker
//! - Translate breaker outcomes into client responses
//!
//! # Design Decisions
//! - Handlers hold their breaker directly; the registry is only touched at
//!   registration time
//! - The inbound body is buffered before `fire`, so a client-side body error
//!   never reaches the breaker

use std::sync::Arc;
use std::time::Instant;

use axum::body::Body;
use axum::http::Request;
use axum::response::{IntoResponse, Response};
use axum::routing::any;
use axum::Router;

use crate::config::SecurityConfig;
use crate::http::forward::{ForwardingAction, UpstreamClient};
use crate::http::request::InboundRequest;
use crate::http::response::GatewayError;
use crate::observability::metrics;
use crate::resilience::{BreakerRegistry, CircuitBreaker};
use crate::routing::{RouteTable, ServiceRoute};

/// Registry type used by the gateway.
pub type ForwardingRegistry = BreakerRegistry<ForwardingAction>;

/// Binds services to breaker-protected handlers.
#[derive(Clone)]
pub struct ProxyGateway {
    registry: Arc<ForwardingRegistry>,
    client: UpstreamClient,
    limits: SecurityConfig,
}

impl ProxyGateway {
    pub fn new(registry: Arc<ForwardingRegistry>, client: UpstreamClient, limits: SecurityConfig) -> Self {
        Self {
            registry,
            client,
            limits,
        }
    }

    pub fn registry(&self) -> &Arc<ForwardingRegistry> {
        &self.registry
    }

    /// Forwarding action for `route` using the shared client.
    pub fn action_for(&self, route: Arc<ServiceRoute>) -> ForwardingAction {
        ForwardingAction::new(route, self.client.clone(), self.limits.max_upstream_body_size)
    }

    /// Handler bound to the breaker for `route`'s service.
    pub fn handle(&self, route: &ServiceRoute, action: ForwardingAction) -> ServiceHandler {
        let breaker = self.registry.get_or_create(route.service_name(), action);
        metrics::record_breaker_state(breaker.name(), breaker.state());
        ServiceHandler {
            breaker,
            max_body_size: self.limits.max_body_size,
        }
    }

    /// Axum router serving every route in `table`.
    pub fn router(&self, table: &RouteTable) -> Router {
        let mut router = Router::new();
        for route in table.routes() {
            let handler = self.handle(route, self.action_for(route.clone()));
            for pattern in route.route_patterns() {
                let handler = handler.clone();
                router = router.route(
                    &pattern,
                    any(move |request: Request<Body>| handler.clone().serve(request)),
                );
            }
            tracing::info!(
                service = %route.service_name(),
                prefix = %route.external_prefix(),
                upstream = %route.upstream_target(),
                base_path = %route.upstream_base_path(),
                "Route registered"
            );
        }
        router
    }
}

/// Request handler for one service.
#[derive(Clone)]
pub struct ServiceHandler {
    breaker: Arc<CircuitBreaker<ForwardingAction>>,
    max_body_size: usize,
}

impl ServiceHandler {
    pub fn breaker(&self) -> &Arc<CircuitBreaker<ForwardingAction>> {
        &self.breaker
    }

    /// Serve one inbound request.
    pub async fn serve(self, request: Request<Body>) -> Response {
        let started = Instant::now();
        let service = self.breaker.name();

        let response = match InboundRequest::from_request(request, self.max_body_size).await {
            Ok(inbound) => {
                let request_id = inbound.request_id().to_string();
                match self.breaker.fire(inbound).await {
                    Ok(relayed) => relayed.into_response(),
                    Err(err) => {
                        if !err.is_open() {
                            tracing::warn!(
                                service = %service,
                                request_id = %request_id,
                                error = %err,
                                "Upstream request failed"
                            );
                        }
                        GatewayError::from_breaker(service, &err).into_response()
                    }
                }
            }
            Err(err) => {
                tracing::warn!(service = %service, error = %err, "Rejected inbound body");
                GatewayError::from_body(service, &err).into_response()
            }
        };

        metrics::record_request(service, response.status().as_u16(), started);
        response
    }
}
