//! Error types for thesaurus operations

use crate::TierKind;
use std::time::Duration;
use thiserror::Error;

/// Graph store errors.
///
/// A word that is absent from the graph is not an error; adapters report it
/// as `Ok(None)`.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum StorageError {
    #[error("Graph store unavailable: {reason}")]
    Unavailable { reason: String },

    #[error("Graph store timed out after {after:?}")]
    Timeout { after: Duration },
}

/// Cache tier errors.
///
/// The resolver recovers from these per tier by treating the tier as a miss.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum CacheError {
    #[error("{tier} cache unavailable: {reason}")]
    Unavailable { tier: TierKind, reason: String },

    #[error("Cache entry serialization failed: {reason}")]
    Serialization { reason: String },
}

/// Configuration errors.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Invalid value for {field}: {value} - {reason}")]
    InvalidValue {
        field: String,
        value: String,
        reason: String,
    },
}

/// Master error type for all thesaurus errors.
#[derive(Debug, Clone, Error)]
pub enum ThesaurusError {
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("Cache error: {0}")]
    Cache(#[from] CacheError),

    #[error("Config error: {0}")]
    Config(#[from] ConfigError),
}

impl ThesaurusError {
    /// True for errors a cache tier raised; the resolver swallows these.
    pub fn is_cache_error(&self) -> bool {
        matches!(self, ThesaurusError::Cache(_))
    }
}

impl From<serde_json::Error> for ThesaurusError {
    fn from(e: serde_json::Error) -> Self {
        ThesaurusError::Cache(CacheError::Serialization {
            reason: e.to_string(),
        })
    }
}

/// Result type alias for thesaurus operations.
pub type ThesaurusResult<T> = Result<T, ThesaurusError>;

// =============================================================================
// TESTS
// =============================================================================
