//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create the Axum Router: one gateway handler per service plus the
//!   internal diagnostics router
//! - Wire up middleware (request ID, tracing)
//! - Serve on a listener until shutdown is signalled

use std::sync::Arc;

use axum::Router;
use hyper_util::{
    client::legacy::{connect::HttpConnector, Client},
    rt::TokioExecutor,
};
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower_http::{
    request_id::{PropagateRequestIdLayer, SetRequestIdLayer},
    trace::TraceLayer,
};

use crate::admin::{internal_router, InternalState};
use crate::config::GatewayConfig;
use crate::http::gateway::{ForwardingRegistry, ProxyGateway};
use crate::http::request::UuidRequestId;
use crate::http::response::not_found;
use crate::observability::{LogObserver, MetricsObserver};
use crate::resilience::{BreakerRegistry, ObserverChain};
use crate::routing::RouteTable;

/// HTTP server for the gateway.
pub struct GatewayServer {
    router: Router,
    config: GatewayConfig,
    registry: Arc<ForwardingRegistry>,
    routes: RouteTable,
}

impl GatewayServer {
    /// Create a new server with the given configuration.
    pub fn new(config: GatewayConfig) -> Self {
        let mut observers = ObserverChain::new().with(Arc::new(LogObserver));
        if config.observability.metrics_enabled {
            observers = observers.with(Arc::new(MetricsObserver));
        }

        let registry = Arc::new(BreakerRegistry::new(
            config.breaker.policy(),
            Arc::new(observers),
        ));
        let client = Client::builder(TokioExecutor::new()).build(HttpConnector::new());
        let gateway = ProxyGateway::new(registry.clone(), client, config.security.clone());

        let routes = RouteTable::from_config(&config);
        if routes.is_empty() {
            tracing::warn!("No services configured; every path will answer 404");
        }

        let internal = internal_router(InternalState {
            inspector: registry.clone(),
            environment: config.environment,
            api_key: config.internal.api_key.clone(),
        });

        let router = Self::build_router(gateway.router(&routes), internal);
        Self {
            router,
            config,
            registry,
            routes,
        }
    }

    /// Build the Axum router with all middleware layers.
    fn build_router(gateway: Router, internal: Router) -> Router {
        gateway
            .merge(internal)
            .fallback(not_found)
            .layer(PropagateRequestIdLayer::x_request_id())
            .layer(TraceLayer::new_for_http())
            .layer(SetRequestIdLayer::x_request_id(UuidRequestId))
    }

    /// Router with all routes and middleware, for in-process use.
    pub fn router(&self) -> Router {
        self.router.clone()
    }

    pub fn registry(&self) -> &Arc<ForwardingRegistry> {
        &self.registry
    }

    pub fn routes(&self) -> &RouteTable {
        &self.routes
    }

    pub fn config(&self) -> &GatewayConfig {
        &self.config
    }

    /// Serve on `listener` until a message arrives on `shutdown`.
    pub async fn run(
        self,
        listener: TcpListener,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(
            address = %addr,
            services = self.routes.len(),
            environment = ?self.config.environment,
            "HTTP server starting"
        );

        axum::serve(listener, self.router)
            .with_graceful_shutdown(async move {
                let _ = shutdown.recv().await;
                tracing::info!("Shutdown signal received, draining connections");
            })
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }
}
