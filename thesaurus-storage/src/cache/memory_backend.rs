//! Process-local substrate for the distributed tier.
//!
//! Behaves like a TTL key-value server without the network hop. Useful for
//! tests and single-process development; it is not shared between processes.
//!
//! Expired keys are dropped when read, and `store` sweeps the whole map once
//! it doubles in size since the last sweep, so keys that are never read again
//! do not accumulate.

use std::collections::HashMap;
use std::sync::RwLock;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use thesaurus_core::{CacheError, ThesaurusError, ThesaurusResult, TierKind};

use super::traits::SharedCacheBackend;

/// Map size below which `store` never sweeps.
const MIN_SWEEP_LEN: usize = 64;

#[derive(Debug)]
struct Slots {
    entries: HashMap<String, (Vec<u8>, Instant)>,
    /// Size at which the next `store` sweeps expired keys.
    sweep_at: usize,
}

impl Slots {
    fn sweep(&mut self, now: Instant) -> usize {
        let before = self.entries.len();
        self.entries.retain(|_, (_, expires_at)| *expires_at > now);
        self.sweep_at = (self.entries.len() * 2).max(MIN_SWEEP_LEN);
        before - self.entries.len()
    }
}

impl Default for Slots {
    fn default() -> Self {
        Self {
            entries: HashMap::new(),
            sweep_at: MIN_SWEEP_LEN,
        }
    }
}

/// In-memory map with per-key expiry.
#[derive(Debug, Default)]
pub struct InMemorySharedBackend {
    slots: RwLock<Slots>,
}

impl InMemorySharedBackend {
    pub fn new() -> Self {
        Self::default()
    }
}

fn poisoned() -> ThesaurusError {
    ThesaurusError::Cache(CacheError::Unavailable {
        tier: TierKind::Distributed,
        reason: "in-memory substrate lock poisoned".to_string(),
    })
}

#[async_trait]
impl SharedCacheBackend for InMemorySharedBackend {
    fn name(&self) -> &'static str {
        "memory"
    }

    async fn fetch(&self, key: &str) -> ThesaurusResult<Option<Vec<u8>>> {
        let now = Instant::now();
        {
            let slots = self.slots.read().map_err(|_| poisoned())?;
            match slots.entries.get(key) {
                Some((value, expires_at)) if *expires_at > now => return Ok(Some(value.clone())),
                None => return Ok(None),
                Some(_) => {}
            }
        }

        // Expired: drop it so the map does not grow without bound.
        let mut slots = self.slots.write().map_err(|_| poisoned())?;
        if matches!(slots.entries.get(key), Some((_, expires_at)) if *expires_at <= now) {
            slots.entries.remove(key);
        }
        Ok(None)
    }

    async fn store(&self, key: &str, value: Vec<u8>, ttl: Duration) -> ThesaurusResult<()> {
        let now = Instant::now();
        let mut slots = self.slots.write().map_err(|_| poisoned())?;
        if slots.entries.len() >= slots.sweep_at {
            slots.sweep(now);
        }
        slots.entries.insert(key.to_string(), (value, now + ttl));
        Ok(())
    }

    async fn remove(&self, key: &str) -> ThesaurusResult<bool> {
        let now = Instant::now();
        let removed = self
            .slots
            .write()
            .map_err(|_| poisoned())?
            .entries
            .remove(key);
        Ok(matches!(removed, Some((_, expires_at)) if expires_at > now))
    }
}
