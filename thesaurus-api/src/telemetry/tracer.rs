//! Tracing Subscriber Initialization
//!
//! Installs a `tracing-subscriber` registry with an env-driven filter and
//! either human-readable or JSON output.

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::error::{ApiError, ApiResult};

/// Filter used when `RUST_LOG` is unset or invalid.
pub const DEFAULT_FILTER: &str =
    "thesaurus_api=debug,thesaurus_storage=debug,tower_http=info,info";

/// Telemetry configuration from environment variables.
#[derive(Debug, Clone)]
pub struct TelemetryConfig {
    /// Service name attached to the startup log line
    pub service_name: String,
    /// Emit one JSON object per event instead of formatted text
    pub json: bool,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            service_name: std::env::var("THESAURUS_SERVICE_NAME")
                .unwrap_or_else(|_| "thesaurus-api".to_string()),
            json: std::env::var("THESAURUS_LOG_FORMAT")
                .map(|s| s.trim().eq_ignore_ascii_case("json"))
                .unwrap_or(false),
        }
    }
}

/// Initialize the tracing subscriber.
///
/// Call once at startup, before anything logs. A second call fails because
/// a global subscriber is already installed.
pub fn init_tracer(config: &TelemetryConfig) -> ApiResult<()> {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));

    let registry = tracing_subscriber::registry().with(env_filter);
    let result = if config.json {
        registry
            .with(tracing_subscriber::fmt::layer().json())
            .try_init()
    } else {
        registry.with(tracing_subscriber::fmt::layer()).try_init()
    };
    result.map_err(|e| ApiError::internal_error(format!("Failed to init subscriber: {}", e)))?;

    tracing::info!(
        service_name = config.service_name,
        json = config.json,
        "Telemetry initialized"
    );

    Ok(())
}
