//! Cache tier traits and statistics.
//!
//! This module defines the capability every tier exposes to the resolver,
//! and the byte-level substrate contract behind the distributed tier.

use std::time::Duration;

use async_trait::async_trait;
use thesaurus_core::{CacheEntry, ThesaurusResult, TierKind, WordKey};

/// One layer of the cache hierarchy.
///
/// The resolver holds tiers as an ordered list and walks them fastest
/// first, so adding a tier never touches the lookup logic.
///
/// # Error contract
///
/// Tiers report an unreachable substrate as a
/// [`CacheError`](thesaurus_core::CacheError). The resolver treats such an
/// error as a miss for reads and skips the tier for writes.
#[async_trait]
pub trait CacheTier: Send + Sync {
    /// Which layer this tier occupies.
    fn kind(&self) -> TierKind;

    /// Get the cached cluster for `key`, or `None` on a miss.
    async fn get(&self, key: &WordKey) -> ThesaurusResult<Option<CacheEntry>>;

    /// Store `entry`, replacing whatever was cached under its key.
    async fn put(&self, entry: CacheEntry) -> ThesaurusResult<()>;

    /// Drop the entry for `key`. Returns whether something was removed.
    async fn invalidate(&self, key: &WordKey) -> ThesaurusResult<bool>;

    /// Snapshot of this tier's counters.
    fn stats(&self) -> CacheStats;
}

/// Byte store behind the distributed tier.
///
/// Expiry is the substrate's job: once `ttl` has passed, `fetch` must
/// behave as if the key was never written.
#[async_trait]
pub trait SharedCacheBackend: Send + Sync {
    /// Short substrate name for logs.
    fn name(&self) -> &'static str;

    /// Read the raw value stored under `key`.
    async fn fetch(&self, key: &str) -> ThesaurusResult<Option<Vec<u8>>>;

    /// Write `value` under `key` with a time-to-live, overwriting.
    async fn store(&self, key: &str, value: Vec<u8>, ttl: Duration) -> ThesaurusResult<()>;

    /// Delete `key`. Returns whether a live value was removed.
    async fn remove(&self, key: &str) -> ThesaurusResult<bool>;
}

/// Statistics about cache usage.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CacheStats {
    /// Number of cache hits.
    pub hits: u64,
    /// Number of cache misses.
    pub misses: u64,
    /// Number of failed substrate calls.
    pub errors: u64,
    /// Number of entries currently in cache, where the tier can tell.
    pub entry_count: u64,
    /// Number of evictions due to capacity.
    pub evictions: u64,
}

impl CacheStats {
    /// Calculate the hit rate (0.0 to 1.0).
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }
}
