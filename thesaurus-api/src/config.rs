//! API Configuration Module
//!
//! Listener settings for the HTTP server. Loaded from environment variables
//! with development defaults.

use std::net::SocketAddr;

use crate::error::{ApiError, ApiResult};

/// HTTP listener configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiConfig {
    /// Interface to bind, e.g. `0.0.0.0`.
    pub bind: String,
    /// TCP port.
    pub port: u16,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            bind: "0.0.0.0".to_string(),
            port: 8000,
        }
    }
}

impl ApiConfig {
    /// Create ApiConfig from environment variables.
    ///
    /// Environment variables:
    /// - `THESAURUS_API_BIND`: interface to bind (default: 0.0.0.0)
    /// - `PORT`, then `THESAURUS_API_PORT`: listen port (default: 8000)
    ///
    /// An unparsable port is an error rather than a silent fallback.
    pub fn from_env() -> ApiResult<Self> {
        let defaults = Self::default();

        let bind = std::env::var("THESAURUS_API_BIND").unwrap_or(defaults.bind);

        let port = match std::env::var("PORT")
            .ok()
            .or_else(|| std::env::var("THESAURUS_API_PORT").ok())
        {
            Some(raw) => raw
                .trim()
                .parse::<u16>()
                .map_err(|_| ApiError::invalid_input(format!("Invalid port value: {}", raw)))?,
            None => defaults.port,
        };

        Ok(Self { bind, port })
    }

    /// Resolve the socket address to listen on.
    pub fn socket_addr(&self) -> ApiResult<SocketAddr> {
        let addr = format!("{}:{}", self.bind, self.port);
        addr.parse::<SocketAddr>().map_err(|e| {
            ApiError::invalid_input(format!("Invalid bind address {}: {}", addr, e))
        })
    }
}
