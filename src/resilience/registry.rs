//! Per-service breaker registry.
//!
//! # Responsibilities
//! - Own every breaker, keyed by service name, for the process lifetime
//! - Create a breaker on first lookup, return the same instance afterwards
//! - Project all breakers into snapshots for diagnostics
//!
//! # Design Decisions
//! - `DashMap` entry API makes check-and-insert atomic per shard, so
//!   concurrent first lookups build exactly one breaker
//! - Entries are never replaced or removed; lookups after creation are a
//!   sharded read
//! - Every breaker shares the registry's policy and observer

use std::collections::BTreeMap;
use std::sync::Arc;

use dashmap::DashMap;

use crate::resilience::circuit_breaker::{Action, BreakerPolicy, BreakerSnapshot, CircuitBreaker};
use crate::resilience::events::BreakerObserver;

/// Read-only view over a set of breakers.
pub trait BreakerInspector: Send + Sync {
    /// Snapshot of every breaker, keyed by service name.
    fn snapshot(&self) -> BTreeMap<String, BreakerSnapshot>;
}

/// Owns one breaker per service.
pub struct BreakerRegistry<A: Action> {
    breakers: DashMap<String, Arc<CircuitBreaker<A>>>,
    policy: BreakerPolicy,
    observer: Arc<dyn BreakerObserver>,
}

impl<A: Action> BreakerRegistry<A> {
    pub fn new(policy: BreakerPolicy, observer: Arc<dyn BreakerObserver>) -> Self {
        Self {
            breakers: DashMap::new(),
            policy,
            observer,
        }
    }

    /// Return the breaker for `service`, creating it around `action` if absent.
    ///
    /// When the breaker already exists `action` is dropped and the existing
    /// instance, with its accumulated state, is returned.
    pub fn get_or_create(&self, service: &str, action: A) -> Arc<CircuitBreaker<A>> {
        if let Some(existing) = self.breakers.get(service) {
            return existing.value().clone();
        }

        self.breakers
            .entry(service.to_string())
            .or_insert_with(|| {
                tracing::debug!(service = %service, "Creating circuit breaker");
                Arc::new(CircuitBreaker::new(
                    service,
                    action,
                    self.policy.clone(),
                    self.observer.clone(),
                ))
            })
            .value()
            .clone()
    }

    /// Look up an existing breaker.
    pub fn get(&self, service: &str) -> Option<Arc<CircuitBreaker<A>>> {
        self.breakers.get(service).map(|b| b.value().clone())
    }

    pub fn len(&self) -> usize {
        self.breakers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.breakers.is_empty()
    }

    /// Snapshot every breaker.
    pub fn snapshot_all(&self) -> BTreeMap<String, BreakerSnapshot> {
        // Clone the handles first so no shard lock is held while breakers lock.
        let breakers: Vec<Arc<CircuitBreaker<A>>> =
            self.breakers.iter().map(|entry| entry.value().clone()).collect();
        breakers
            .into_iter()
            .map(|b| (b.name().to_string(), b.snapshot()))
            .collect()
    }
}

impl<A: Action> BreakerInspector for BreakerRegistry<A> {
    fn snapshot(&self) -> BTreeMap<String, BreakerSnapshot> {
        self.snapshot_all()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resilience::circuit_breaker::tests::{Scripted, Step};
    use crate::resilience::circuit_breaker::CircuitState;
    use crate::resilience::events::NoopObserver;

    fn registry() -> BreakerRegistry<Scripted> {
        BreakerRegistry::new(BreakerPolicy::default(), Arc::new(NoopObserver))
    }

    #[tokio::test]
    async fn test_same_name_returns_same_breaker() {
        let registry = registry();
        let first = registry.get_or_create("products", Scripted::default());
        let _ = first.fire(Step::Fail).await;

        let second = registry.get_or_create("products", Scripted::default());
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(second.snapshot().stats.counts.failures, 1, "state preserved");

        let other = registry.get_or_create("orders", Scripted::default());
        assert!(!Arc::ptr_eq(&first, &other));
        assert_eq!(registry.len(), 2);
    }

    #[tokio::test]
    async fn test_existing_breaker_keeps_original_action() {
        let registry = registry();
        let original = Scripted::default();
        let replacement = Scripted::default();

        registry.get_or_create("products", original.clone());
        let breaker = registry.get_or_create("products", replacement.clone());
        let _ = breaker.fire(Step::Succeed).await;

        assert_eq!(original.calls(), 1);
        assert_eq!(replacement.calls(), 0);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_first_access_creates_one_breaker() {
        let registry = Arc::new(registry());
        let mut handles = Vec::new();
        for _ in 0..64 {
            let registry = registry.clone();
            handles.push(tokio::spawn(async move {
                registry.get_or_create("products", Scripted::default())
            }));
        }

        let mut breakers = Vec::new();
        for handle in handles {
            breakers.push(handle.await.unwrap());
        }
        assert_eq!(registry.len(), 1);
        assert!(breakers.iter().all(|b| Arc::ptr_eq(b, &breakers[0])));
    }

    #[tokio::test]
    async fn test_snapshot_all_reports_each_service() {
        let registry = registry();
        let products = registry.get_or_create("products", Scripted::default());
        registry.get_or_create("orders", Scripted::default());
        let _ = products.fire(Step::Succeed).await;

        let inspector: &dyn BreakerInspector = &registry;
        let snapshot = inspector.snapshot();
        assert_eq!(snapshot.keys().collect::<Vec<_>>(), vec!["orders", "products"]);
        assert_eq!(snapshot["products"].state, CircuitState::Closed);
        assert_eq!(snapshot["products"].stats.counts.successes, 1);
        assert_eq!(snapshot["orders"].stats.counts.volume(), 0);
    }
}
