//! Thesaurus API - HTTP Layer
//!
//! Exposes the tiered synonym resolver over REST (Axum). Handlers are thin:
//! they map resolver outcomes onto the response envelope and error codes.

#[macro_use]
pub mod macros;

pub mod config;
pub mod error;
pub mod routes;
pub mod state;
pub mod telemetry;
pub mod types;

// Re-export commonly used types
pub use config::ApiConfig;
pub use error::{ApiError, ApiResult, ErrorCode};
pub use routes::create_api_router;
pub use state::AppState;
pub use types::*;
