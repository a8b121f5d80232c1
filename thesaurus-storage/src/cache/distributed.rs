//! Shared, TTL-bounded cache tier.
//!
//! Entries are serialized to JSON and handed to a [`SharedCacheBackend`].
//! Each substrate call is bounded by `op_timeout`; a timeout or substrate
//! failure surfaces as [`CacheError::Unavailable`] so the resolver can fall
//! through instead of hanging.

use std::future::Future;
use std::sync::{Arc, RwLock};
use std::time::Duration;

use async_trait::async_trait;
use thesaurus_core::{CacheEntry, CacheError, ThesaurusError, ThesaurusResult, TierKind, WordKey};

use super::traits::{CacheStats, CacheTier, SharedCacheBackend};

/// Namespace prepended to every key written to the substrate.
pub const KEY_PREFIX: &str = "synonyms:";

/// Distributed tier over a pluggable substrate.
///
/// Reads never promote or mutate; writes overwrite unconditionally.
pub struct DistributedTier {
    backend: Arc<dyn SharedCacheBackend>,
    ttl: Duration,
    op_timeout: Duration,
    stats: RwLock<CacheStats>,
}

impl DistributedTier {
    /// Create a tier writing entries with `ttl` and bounding each call by
    /// `op_timeout`.
    pub fn new(backend: Arc<dyn SharedCacheBackend>, ttl: Duration, op_timeout: Duration) -> Self {
        Self {
            backend,
            ttl,
            op_timeout,
            stats: RwLock::new(CacheStats::default()),
        }
    }

    fn storage_key(key: &str) -> String {
        format!("{}{}", KEY_PREFIX, key)
    }

    fn record(&self, update: impl FnOnce(&mut CacheStats)) {
        if let Ok(mut stats) = self.stats.write() {
            update(&mut stats);
        }
    }

    /// Run a substrate call under the operation timeout.
    async fn bounded<T, F>(&self, call: F) -> ThesaurusResult<T>
    where
        F: Future<Output = ThesaurusResult<T>>,
    {
        let result = match tokio::time::timeout(self.op_timeout, call).await {
            Ok(result) => result,
            Err(_) => Err(ThesaurusError::Cache(CacheError::Unavailable {
                tier: TierKind::Distributed,
                reason: format!(
                    "{} call timed out after {:?}",
                    self.backend.name(),
                    self.op_timeout
                ),
            })),
        };
        if result.is_err() {
            self.record(|s| s.errors += 1);
        }
        result
    }
}

#[async_trait]
impl CacheTier for DistributedTier {
    fn kind(&self) -> TierKind {
        TierKind::Distributed
    }

    async fn get(&self, key: &WordKey) -> ThesaurusResult<Option<CacheEntry>> {
        let storage_key = Self::storage_key(key.as_str());
        let Some(bytes) = self.bounded(self.backend.fetch(&storage_key)).await? else {
            self.record(|s| s.misses += 1);
            return Ok(None);
        };

        let entry: CacheEntry = serde_json::from_slice(&bytes)?;
        self.record(|s| s.hits += 1);
        Ok(Some(entry))
    }

    async fn put(&self, entry: CacheEntry) -> ThesaurusResult<()> {
        let storage_key = Self::storage_key(&entry.key);
        let bytes = serde_json::to_vec(&entry)?;
        self.bounded(self.backend.store(&storage_key, bytes, self.ttl))
            .await
    }

    async fn invalidate(&self, key: &WordKey) -> ThesaurusResult<bool> {
        let storage_key = Self::storage_key(key.as_str());
        self.bounded(self.backend.remove(&storage_key)).await
    }

    fn stats(&self) -> CacheStats {
        self.stats
            .read()
            .map(|stats| stats.clone())
            .unwrap_or_default()
    }
}
