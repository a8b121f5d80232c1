//! Health Check Endpoint
//!
//! `GET /health` reports process uptime and per-tier cache counters. It
//! never touches the graph store, so it stays cheap under load.

use std::sync::Arc;
use std::time::Instant;

use axum::{extract::State, routing::get, Json, Router};
use thesaurus_storage::SynonymResolver;

use crate::state::AppState;
use crate::types::{HealthResponse, TierHealth};

/// GET /health - Liveness plus cache statistics
pub async fn health(
    State(resolver): State<Arc<SynonymResolver>>,
    State(start_time): State<Instant>,
) -> Json<HealthResponse> {
    let tiers = resolver
        .stats()
        .iter()
        .map(|(kind, stats)| TierHealth::new(*kind, stats))
        .collect();

    Json(HealthResponse {
        status: "ok".to_string(),
        uptime_secs: start_time.elapsed().as_secs(),
        tiers,
    })
}

/// Create health check router (no auth required)
pub fn create_router() -> Router<AppState> {
    Router::new().route("/health", get(health))
}
