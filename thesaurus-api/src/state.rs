//! Shared application state for Axum routers.

use std::sync::Arc;
use std::time::Instant;

use thesaurus_storage::SynonymResolver;

/// Application-wide state shared across all routes.
#[derive(Clone)]
pub struct AppState {
    pub resolver: Arc<SynonymResolver>,
    pub start_time: Instant,
}

impl AppState {
    pub fn new(resolver: Arc<SynonymResolver>) -> Self {
        Self {
            resolver,
            start_time: Instant::now(),
        }
    }
}

crate::impl_from_ref!(Arc<SynonymResolver>, resolver);
crate::impl_from_ref!(Instant, start_time);
