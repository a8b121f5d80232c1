//! In-process LRU tier.
//!
//! A single mutex guards the LRU list because a read also reorders it.
//! The guard is taken and released inside each call; it is never held
//! across an `.await`.

use std::num::NonZeroUsize;
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use lru::LruCache;
use thesaurus_core::{CacheEntry, ConfigError, ThesaurusError, ThesaurusResult, TierKind, WordKey};

use super::traits::{CacheStats, CacheTier};

struct LocalInner {
    entries: LruCache<String, CacheEntry>,
    stats: CacheStats,
}

/// Bounded, recency-evicted cache of resolved clusters.
///
/// Entries never expire by time here; only capacity pressure removes them.
pub struct LocalTier {
    inner: Mutex<LocalInner>,
}

impl LocalTier {
    /// Create a tier holding at most `capacity` words.
    pub fn new(capacity: usize) -> ThesaurusResult<Self> {
        let capacity = NonZeroUsize::new(capacity).ok_or_else(|| {
            ThesaurusError::Config(ConfigError::InvalidValue {
                field: "local.capacity".to_string(),
                value: capacity.to_string(),
                reason: "capacity must be greater than 0".to_string(),
            })
        })?;

        Ok(Self {
            inner: Mutex::new(LocalInner {
                entries: LruCache::new(capacity),
                stats: CacheStats::default(),
            }),
        })
    }

    pub fn len(&self) -> usize {
        self.lock().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Check membership without touching recency.
    pub fn contains(&self, key: &WordKey) -> bool {
        self.lock().entries.contains(key.as_str())
    }

    fn lock(&self) -> MutexGuard<'_, LocalInner> {
        // LRU state stays structurally valid if a holder panicked.
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[async_trait]
impl CacheTier for LocalTier {
    fn kind(&self) -> TierKind {
        TierKind::Local
    }

    async fn get(&self, key: &WordKey) -> ThesaurusResult<Option<CacheEntry>> {
        let mut inner = self.lock();
        let found = inner.entries.get(key.as_str()).cloned();
        if found.is_some() {
            inner.stats.hits += 1;
        } else {
            inner.stats.misses += 1;
        }
        Ok(found)
    }

    async fn put(&self, entry: CacheEntry) -> ThesaurusResult<()> {
        let mut inner = self.lock();
        let key = entry.key.clone();
        if let Some((evicted, _)) = inner.entries.push(key.clone(), entry) {
            if evicted != key {
                inner.stats.evictions += 1;
                tracing::debug!(evicted = %evicted, "local tier evicted least recently used word");
            }
        }
        Ok(())
    }

    async fn invalidate(&self, key: &WordKey) -> ThesaurusResult<bool> {
        Ok(self.lock().entries.pop(key.as_str()).is_some())
    }

    fn stats(&self) -> CacheStats {
        let inner = self.lock();
        CacheStats {
            entry_count: inner.entries.len() as u64,
            ..inner.stats.clone()
        }
    }
}
