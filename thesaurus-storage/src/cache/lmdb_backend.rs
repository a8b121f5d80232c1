//! LMDB substrate for the distributed tier.
//!
//! Uses the heed crate (Rust bindings for LMDB) to provide a memory-mapped
//! key-value store that every process on the host can open at the same path.
//!
//! # Value Format
//!
//! `[expires_at: 8 bytes, i64 millis LE][payload]`
//!
//! LMDB has no native expiry, so the deadline travels with the value. A read
//! past the deadline reports a miss and deletes the key. Keys that are never
//! read again are reclaimed by `store`: once the map is three-quarters used it
//! sweeps expired values (at most once every `SWEEP_INTERVAL_WRITES` writes),
//! and a write that still hits `MDB_MAP_FULL` purges and retries once.
//!
//! # Thread Safety
//!
//! LMDB provides ACID transactions. The backend uses:
//! - Read transactions for `fetch`
//! - Write transactions for `store`, `remove` and expiry cleanup
//!
//! Expiry cleanup re-reads the deadline inside its write transaction, so a
//! value another process stored in the meantime is never deleted.
//!
//! Transactions block (the writer lock is shared across processes), so every
//! trait call runs on the blocking pool.

use std::path::Path;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use heed::types::Bytes;
use heed::{Database, Env, EnvOpenOptions, MdbError, RwTxn};
use thesaurus_core::{CacheError, ThesaurusError, ThesaurusResult, TierKind};

use super::traits::SharedCacheBackend;

const HEADER_LEN: usize = 8;

/// Minimum number of writes between two high-water sweeps.
const SWEEP_INTERVAL_WRITES: u64 = 64;

/// Error type for LMDB cache operations.
#[derive(Debug, thiserror::Error)]
pub enum LmdbCacheError {
    /// Failed to open or create the LMDB environment.
    #[error("Failed to open LMDB environment: {0}")]
    EnvOpen(String),

    /// Failed to open the database within the environment.
    #[error("Failed to open database: {0}")]
    DbOpen(String),

    /// Transaction error.
    #[error("Transaction error: {0}")]
    Transaction(String),

    /// Stored value is shorter than its header.
    #[error("Corrupt value under key {0}")]
    Corrupt(String),

    /// The blocking task running a transaction panicked or was cancelled.
    #[error("LMDB task failed: {0}")]
    Task(String),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Convert LmdbCacheError to ThesaurusError.
impl From<LmdbCacheError> for ThesaurusError {
    fn from(e: LmdbCacheError) -> Self {
        ThesaurusError::Cache(CacheError::Unavailable {
            tier: TierKind::Distributed,
            reason: e.to_string(),
        })
    }
}

fn txn_err(e: heed::Error) -> LmdbCacheError {
    LmdbCacheError::Transaction(e.to_string())
}

fn is_map_full(e: &heed::Error) -> bool {
    matches!(e, heed::Error::Mdb(MdbError::MapFull))
}

fn now_millis() -> i64 {
    Utc::now().timestamp_millis()
}

fn encode(value: &[u8], ttl: Duration) -> Vec<u8> {
    let ttl_millis = i64::try_from(ttl.as_millis()).unwrap_or(i64::MAX);
    let expires_at = now_millis().saturating_add(ttl_millis);

    let mut framed = Vec::with_capacity(HEADER_LEN + value.len());
    framed.extend_from_slice(&expires_at.to_le_bytes());
    framed.extend_from_slice(value);
    framed
}

/// Split a stored value into its deadline and payload.
fn decode<'a>(key: &str, bytes: &'a [u8]) -> Result<(i64, &'a [u8]), LmdbCacheError> {
    if bytes.len() < HEADER_LEN {
        return Err(LmdbCacheError::Corrupt(key.to_string()));
    }
    let (header, payload) = bytes.split_at(HEADER_LEN);
    let header: [u8; HEADER_LEN] = header
        .try_into()
        .map_err(|_| LmdbCacheError::Corrupt(key.to_string()))?;
    Ok((i64::from_le_bytes(header), payload))
}

/// True when a stored value is past its deadline or cannot be decoded.
fn is_dead(value: &[u8], now: i64) -> bool {
    match decode("", value) {
        Ok((expires_at, _)) => expires_at <= now,
        Err(_) => true,
    }
}

/// LMDB-backed shared cache substrate.
///
/// Cloning is cheap: clones share one environment and sweep schedule.
///
/// # Example
///
/// ```ignore
/// use thesaurus_storage::cache::{DistributedTier, LmdbCacheBackend};
///
/// let backend = Arc::new(LmdbCacheBackend::new("/var/cache/thesaurus", 64)?);
/// let tier = DistributedTier::new(backend, Duration::from_secs(60), Duration::from_millis(500));
/// ```
#[derive(Clone)]
pub struct LmdbCacheBackend {
    /// The LMDB environment.
    env: Env,
    /// The main database (single unnamed database).
    db: Database<Bytes, Bytes>,
    /// Configured map size in bytes.
    map_size: usize,
    writes_since_sweep: Arc<AtomicU64>,
}

impl LmdbCacheBackend {
    /// Create a new LMDB cache backend.
    ///
    /// # Arguments
    ///
    /// * `path` - Directory where LMDB files will be stored
    /// * `max_size_mb` - Maximum size of the database in megabytes
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The directory cannot be created
    /// - LMDB environment cannot be opened
    /// - Database cannot be created
    pub fn new<P: AsRef<Path>>(path: P, max_size_mb: usize) -> Result<Self, LmdbCacheError> {
        std::fs::create_dir_all(&path)?;

        let map_size = max_size_mb * 1024 * 1024;
        // Safety: the environment is opened once per process and path; heed
        // requires the caller to avoid opening the same path twice in one process.
        let env = unsafe {
            EnvOpenOptions::new()
                .map_size(map_size)
                .max_dbs(1)
                .open(path.as_ref())
        }
        .map_err(|e| LmdbCacheError::EnvOpen(e.to_string()))?;

        let mut wtxn = env.write_txn().map_err(txn_err)?;
        let db: Database<Bytes, Bytes> = env
            .create_database(&mut wtxn, None)
            .map_err(|e| LmdbCacheError::DbOpen(e.to_string()))?;
        wtxn.commit().map_err(txn_err)?;

        Ok(Self {
            env,
            db,
            map_size,
            writes_since_sweep: Arc::new(AtomicU64::new(SWEEP_INTERVAL_WRITES)),
        })
    }

    /// Delete every expired value. Returns how many were removed.
    pub fn purge_expired(&self) -> Result<u64, LmdbCacheError> {
        let now = now_millis();
        let candidates: Vec<Vec<u8>> = {
            let rtxn = self.env.read_txn().map_err(txn_err)?;
            let mut keys = Vec::new();
            for result in self.db.iter(&rtxn).map_err(txn_err)? {
                let Ok((key, value)) = result else { continue };
                if is_dead(value, now) {
                    keys.push(key.to_vec());
                }
            }
            keys
        };
        if candidates.is_empty() {
            return Ok(0);
        }

        let mut wtxn = self.env.write_txn().map_err(txn_err)?;
        let mut deleted = 0u64;
        for key in &candidates {
            if self.delete_if_dead(&mut wtxn, key, now).map_err(txn_err)? {
                deleted += 1;
            }
        }
        wtxn.commit().map_err(txn_err)?;

        Ok(deleted)
    }

    /// Bytes held by the database's pages.
    fn used_bytes(&self) -> Result<usize, LmdbCacheError> {
        let rtxn = self.env.read_txn().map_err(txn_err)?;
        let stat = self.db.stat(&rtxn).map_err(txn_err)?;
        let pages = stat.branch_pages + stat.leaf_pages + stat.overflow_pages;
        Ok(pages * stat.page_size as usize)
    }

    /// Purge expired values when the map is past its high-water mark.
    fn sweep_if_crowded(&self) -> Result<(), LmdbCacheError> {
        let writes = self.writes_since_sweep.fetch_add(1, Ordering::Relaxed) + 1;
        if writes < SWEEP_INTERVAL_WRITES || self.used_bytes()? < self.map_size / 4 * 3 {
            return Ok(());
        }

        self.writes_since_sweep.store(0, Ordering::Relaxed);
        let purged = self.purge_expired()?;
        tracing::debug!(purged, "Swept expired values from LMDB");
        Ok(())
    }

    /// Delete `key` only if the value stored right now is still expired.
    fn delete_if_dead(&self, wtxn: &mut RwTxn, key: &[u8], now: i64) -> Result<bool, heed::Error> {
        let dead = match self.db.get(&*wtxn, key)? {
            Some(value) => is_dead(value, now),
            None => false,
        };
        if dead {
            self.db.delete(wtxn, key)?;
        }
        Ok(dead)
    }

    fn remove_if_expired(&self, key: &str) -> Result<bool, LmdbCacheError> {
        let mut wtxn = self.env.write_txn().map_err(txn_err)?;
        let deleted = self
            .delete_if_dead(&mut wtxn, key.as_bytes(), now_millis())
            .map_err(txn_err)?;
        wtxn.commit().map_err(txn_err)?;
        Ok(deleted)
    }

    fn fetch_sync(&self, key: &str) -> Result<Option<Vec<u8>>, LmdbCacheError> {
        let live = {
            let rtxn = self.env.read_txn().map_err(txn_err)?;
            match self.db.get(&rtxn, key.as_bytes()).map_err(txn_err)? {
                None => return Ok(None),
                Some(bytes) => {
                    let (expires_at, payload) = decode(key, bytes)?;
                    (expires_at > now_millis()).then(|| payload.to_vec())
                }
            }
        };

        if live.is_none() {
            self.remove_if_expired(key)?;
        }
        Ok(live)
    }

    fn put_framed(&self, key: &[u8], framed: &[u8]) -> Result<(), heed::Error> {
        let mut wtxn = self.env.write_txn()?;
        self.db.put(&mut wtxn, key, framed)?;
        wtxn.commit()
    }

    fn store_sync(&self, key: &str, value: &[u8], ttl: Duration) -> Result<(), LmdbCacheError> {
        self.sweep_if_crowded()?;

        let framed = encode(value, ttl);
        match self.put_framed(key.as_bytes(), &framed) {
            Err(e) if is_map_full(&e) => {
                let purged = self.purge_expired()?;
                tracing::warn!(purged, "LMDB map full, purged expired values before retrying");
                self.put_framed(key.as_bytes(), &framed).map_err(txn_err)
            }
            result => result.map_err(txn_err),
        }
    }

    fn delete_key(&self, key: &str) -> Result<bool, LmdbCacheError> {
        let mut wtxn = self.env.write_txn().map_err(txn_err)?;
        let deleted = self.db.delete(&mut wtxn, key.as_bytes()).map_err(txn_err)?;
        wtxn.commit().map_err(txn_err)?;
        Ok(deleted)
    }

    /// Run a transaction on the blocking pool.
    async fn blocking<T, F>(&self, op: F) -> ThesaurusResult<T>
    where
        T: Send + 'static,
        F: FnOnce(&LmdbCacheBackend) -> Result<T, LmdbCacheError> + Send + 'static,
    {
        let backend = self.clone();
        let result = tokio::task::spawn_blocking(move || op(&backend))
            .await
            .map_err(|e| LmdbCacheError::Task(e.to_string()))?;
        Ok(result?)
    }
}

#[async_trait]
impl SharedCacheBackend for LmdbCacheBackend {
    fn name(&self) -> &'static str {
        "lmdb"
    }

    async fn fetch(&self, key: &str) -> ThesaurusResult<Option<Vec<u8>>> {
        let key = key.to_string();
        self.blocking(move |backend| backend.fetch_sync(&key)).await
    }

    async fn store(&self, key: &str, value: Vec<u8>, ttl: Duration) -> ThesaurusResult<()> {
        let key = key.to_string();
        self.blocking(move |backend| backend.store_sync(&key, &value, ttl))
            .await
    }

    async fn remove(&self, key: &str) -> ThesaurusResult<bool> {
        let key = key.to_string();
        self.blocking(move |backend| backend.delete_key(&key)).await
    }
}
