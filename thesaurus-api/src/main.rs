//! Thesaurus API Server Entry Point
//!
//! Bootstraps configuration, connects the graph store, builds the resolver
//! tier chain and starts the Axum HTTP server.

use std::sync::Arc;

use axum::Router;
use thesaurus_api::telemetry::{init_tracer, TelemetryConfig};
use thesaurus_api::{create_api_router, ApiConfig, ApiError, ApiResult, AppState};
use thesaurus_core::ResolverConfig;
use thesaurus_storage::{DbConfig, PgGraphStore, SynonymResolver};

#[tokio::main]
async fn main() -> ApiResult<()> {
    let telemetry_config = TelemetryConfig::default();
    init_tracer(&telemetry_config)?;

    let api_config = ApiConfig::from_env()?;
    let resolver_config = ResolverConfig::from_env().map_err(|e| {
        ApiError::invalid_input(format!("Invalid resolver configuration: {}", e))
    })?;

    let db_config = DbConfig::from_env();
    let graph = PgGraphStore::from_config(&db_config)?;
    graph.ensure_schema().await?;

    let resolver = SynonymResolver::from_config(Arc::new(graph), &resolver_config)?;
    let app: Router = create_api_router(AppState::new(Arc::new(resolver)));

    let addr = api_config.socket_addr()?;
    tracing::info!(%addr, "Starting thesaurus API server");

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .map_err(|e| ApiError::internal_error(format!("Failed to bind {}: {}", addr, e)))?;

    let server = axum::serve(listener, app);
    tokio::select! {
        result = server => {
            result.map_err(|e| ApiError::internal_error(format!("Server error: {}", e)))?;
        }
        _ = tokio::signal::ctrl_c() => {
            tracing::info!("Shutdown signal received");
        }
    }

    Ok(())
}
