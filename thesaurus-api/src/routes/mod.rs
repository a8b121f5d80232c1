//! REST API Routes Module
//!
//! Includes:
//! - Synonym lookup
//! - Health check with cache statistics

pub mod health;
pub mod synonym;

use axum::Router;
use tower_http::trace::TraceLayer;

use crate::state::AppState;

pub use health::create_router as health_router;
pub use synonym::create_router as synonym_router;

/// Create the complete API router.
///
/// Every request gets a `tower-http` trace span; the resolver adds a child
/// span per lookup.
pub fn create_api_router(state: AppState) -> Router {
    Router::new()
        .merge(synonym_router())
        .merge(health_router())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
