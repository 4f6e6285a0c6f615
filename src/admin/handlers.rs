use std::collections::BTreeMap;

use axum::{
    extract::{Query, State},
    Json,
};
use serde::Deserialize;

use crate::admin::InternalState;
use crate::resilience::BreakerSnapshot;

#[derive(Debug, Default, Deserialize)]
pub struct BreakerQuery {
    pub service: Option<String>,
}

/// `GET /internal/circuit-breakers`: service name → state and stats.
pub async fn get_circuit_breakers(
    State(state): State<InternalState>,
    Query(query): Query<BreakerQuery>,
) -> Json<BTreeMap<String, BreakerSnapshot>> {
    let mut snapshot = state.inspector.snapshot();
    if let Some(service) = query.service {
        snapshot.retain(|name, _| *name == service);
    }
    Json(snapshot)
}
