//! Response bodies for the HTTP API.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use thesaurus_core::{Resolution, TierKind};
use thesaurus_storage::CacheStats;

// ============================================================================
// SYNONYMS
// ============================================================================

/// Body of `GET /synonym/{word}`.
///
/// `data` holds a single entry keyed by the normalized word.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SynonymResponse {
    pub data: BTreeMap<String, Vec<String>>,
    pub meta_data: MetaData,
}

/// Where the answer came from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetaData {
    pub cache_flag: bool,
    /// `"LRUCache"` or `"Redis"`; absent when the graph was traversed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cache: Option<String>,
}

impl From<Resolution> for SynonymResponse {
    fn from(resolution: Resolution) -> Self {
        let meta_data = MetaData {
            cache_flag: resolution.cache_flag(),
            cache: resolution.provenance.cache_label().map(str::to_string),
        };
        let mut data = BTreeMap::new();
        data.insert(resolution.word, resolution.synonyms);
        Self { data, meta_data }
    }
}

// ============================================================================
// HEALTH
// ============================================================================

/// Body of `GET /health`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub uptime_secs: u64,
    pub tiers: Vec<TierHealth>,
}

/// Counters for one cache tier.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TierHealth {
    pub tier: TierKind,
    pub hits: u64,
    pub misses: u64,
    pub entries: u64,
    pub evictions: u64,
    pub hit_rate: f64,
}

impl TierHealth {
    pub fn new(tier: TierKind, stats: &CacheStats) -> Self {
        Self {
            tier,
            hits: stats.hits,
            misses: stats.misses,
            entries: stats.entry_count,
            evictions: stats.evictions,
            hit_rate: stats.hit_rate(),
        }
    }
}
