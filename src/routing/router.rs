//! Route table compiled from configuration.
//!
//! # Responsibilities
//! - Turn the configured service map into `ServiceRoute`s, once, at startup
//! - Skip services without an upstream URL
//!
//! # Design Decisions
//! - Immutable after construction (thread-safe without locks)
//! - Nested prefixes are all registered; the axum router dispatches to the
//!   most specific pattern
//! - Duplicate external prefixes are dropped with a warning; first by
//!   service name wins

use std::collections::HashSet;
use std::sync::Arc;

use crate::config::GatewayConfig;
use crate::routing::route::ServiceRoute;

/// Immutable set of service routes.
#[derive(Debug, Clone, Default)]
pub struct RouteTable {
    routes: Vec<Arc<ServiceRoute>>,
}

impl RouteTable {
    /// Compile routes from configuration.
    pub fn from_config(config: &GatewayConfig) -> Self {
        let mut prefixes = HashSet::new();
        let mut routes = Vec::new();

        for (name, entry) in &config.services {
            if entry.is_empty() {
                tracing::warn!(service = %name, "Service has no upstream URL, skipping");
                continue;
            }

            let base_path = entry
                .base_path()
                .map(str::to_string)
                .unwrap_or_else(|| format!("/{}", name));
            let external_prefix = entry
                .external_prefix()
                .map(str::to_string)
                .unwrap_or_else(|| format!("{}/{}", config.api_prefix.trim_end_matches('/'), name));

            let route = ServiceRoute::new(name.as_str(), entry.url(), base_path, external_prefix);
            if !prefixes.insert(route.external_prefix().to_string()) {
                tracing::warn!(
                    service = %name,
                    prefix = %route.external_prefix(),
                    "Duplicate external prefix, skipping"
                );
                continue;
            }
            routes.push(Arc::new(route));
        }

        Self { routes }
    }

    /// Build from explicit routes.
    pub fn new(routes: Vec<ServiceRoute>) -> Self {
        Self {
            routes: routes.into_iter().map(Arc::new).collect(),
        }
    }

    pub fn routes(&self) -> &[Arc<ServiceRoute>] {
        &self.routes
    }

    pub fn len(&self) -> usize {
        self.routes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }
}
