//! Internal diagnostics endpoint.

pub mod auth;
pub mod handlers;

use std::sync::Arc;

use axum::{middleware, routing::get, Router};

use self::auth::internal_key_middleware;
use self::handlers::get_circuit_breakers;
use crate::config::Environment;
use crate::resilience::BreakerInspector;

/// State shared by internal handlers.
#[derive(Clone)]
pub struct InternalState {
    pub inspector: Arc<dyn BreakerInspector>,
    pub environment: Environment,
    pub api_key: Option<String>,
}

pub fn internal_router(state: InternalState) -> Router {
    Router::new()
        .route("/internal/circuit-breakers", get(get_circuit_breakers))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            internal_key_middleware,
        ))
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resilience::{BreakerSnapshot, BreakerStats, CircuitState, WindowCounts};
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use std::collections::BTreeMap;
    use tower::ServiceExt;

    struct Fixed;

    impl BreakerInspector for Fixed {
        fn snapshot(&self) -> BTreeMap<String, BreakerSnapshot> {
            ["orders", "products"]
                .into_iter()
                .map(|name| {
                    (
                        name.to_string(),
                        BreakerSnapshot {
                            service: name.to_string(),
                            state: CircuitState::Closed,
                            stats: BreakerStats {
                                counts: WindowCounts::default(),
                                error_percentage: 0.0,
                                probe_in_flight: false,
                            },
                        },
                    )
                })
                .collect()
        }
    }

    fn router(environment: Environment, api_key: Option<&str>) -> Router {
        internal_router(InternalState {
            inspector: Arc::new(Fixed),
            environment,
            api_key: api_key.map(str::to_string),
        })
    }

    async fn get(router: Router, uri: &str, key: Option<&str>) -> (StatusCode, serde_json::Value) {
        let mut request = Request::get(uri);
        if let Some(key) = key {
            request = request.header(auth::X_INTERNAL_KEY, key);
        }
        let response = router
            .oneshot(request.body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn test_development_is_open() {
        let (status, body) = get(
            router(Environment::Development, None),
            "/internal/circuit-breakers",
            None,
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["products"]["state"], "CLOSED");
        assert_eq!(body["products"]["stats"]["failures"], 0);
    }

    #[tokio::test]
    async fn test_production_requires_key() {
        let app = router(Environment::Production, Some("secret"));

        let (status, body) = get(app.clone(), "/internal/circuit-breakers", None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["message"], "Invalid internal key");

        let (status, _) = get(app.clone(), "/internal/circuit-breakers", Some("wrong")).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);

        let (status, body) = get(app, "/internal/circuit-breakers", Some("secret")).await;
        assert_eq!(status, StatusCode::OK);
        assert!(body.get("orders").is_some());
    }

    #[tokio::test]
    async fn test_production_without_configured_key_rejects() {
        let (status, _) = get(
            router(Environment::Production, None),
            "/internal/circuit-breakers",
            Some(""),
        )
        .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_service_filter() {
        let (status, body) = get(
            router(Environment::Development, None),
            "/internal/circuit-breakers?service=orders",
            None,
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        let map = body.as_object().unwrap();
        assert_eq!(map.len(), 1);
        assert!(map.contains_key("orders"));
    }
}
