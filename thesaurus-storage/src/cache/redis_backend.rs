//! Redis substrate for the distributed tier.
//!
//! The connection is established lazily on first use, so a Redis outage at
//! startup only costs cache hits, not the process. Once connected, the
//! `ConnectionManager` reconnects on its own after transient failures.

use std::time::Duration;

use async_trait::async_trait;
use redis::aio::ConnectionManager;
use redis::AsyncCommands;
use thesaurus_core::{CacheError, ThesaurusError, ThesaurusResult, TierKind};
use tokio::sync::OnceCell;

use super::traits::SharedCacheBackend;

fn unavailable(e: impl std::fmt::Display) -> ThesaurusError {
    ThesaurusError::Cache(CacheError::Unavailable {
        tier: TierKind::Distributed,
        reason: format!("redis: {}", e),
    })
}

/// Redis-backed shared cache substrate.
pub struct RedisCacheBackend {
    client: redis::Client,
    conn: OnceCell<ConnectionManager>,
}

impl RedisCacheBackend {
    /// Create a backend for `redis://host:port/db`. No connection is made yet.
    pub fn new(host: &str, port: u16, db: i64) -> ThesaurusResult<Self> {
        Self::from_url(&format!("redis://{}:{}/{}", host, port, db))
    }

    /// Create a backend from a full connection URL.
    pub fn from_url(url: &str) -> ThesaurusResult<Self> {
        let client = redis::Client::open(url).map_err(unavailable)?;
        Ok(Self {
            client,
            conn: OnceCell::new(),
        })
    }

    async fn connection(&self) -> ThesaurusResult<ConnectionManager> {
        let conn = self
            .conn
            .get_or_try_init(|| async {
                let manager = ConnectionManager::new(self.client.clone())
                    .await
                    .map_err(unavailable)?;
                tracing::info!("Connected to redis");
                Ok::<_, ThesaurusError>(manager)
            })
            .await?;
        Ok(conn.clone())
    }
}

/// Whole seconds for `SET EX`, rounded up; Redis rejects a zero expiry.
fn ttl_secs(ttl: Duration) -> u64 {
    (ttl.as_secs() + u64::from(ttl.subsec_nanos() > 0)).max(1)
}

#[async_trait]
impl SharedCacheBackend for RedisCacheBackend {
    fn name(&self) -> &'static str {
        "redis"
    }

    async fn fetch(&self, key: &str) -> ThesaurusResult<Option<Vec<u8>>> {
        let mut conn = self.connection().await?;
        conn.get::<_, Option<Vec<u8>>>(key)
            .await
            .map_err(unavailable)
    }

    async fn store(&self, key: &str, value: Vec<u8>, ttl: Duration) -> ThesaurusResult<()> {
        let mut conn = self.connection().await?;
        conn.set_ex::<_, _, ()>(key, value, ttl_secs(ttl))
            .await
            .map_err(unavailable)
    }

    async fn remove(&self, key: &str) -> ThesaurusResult<bool> {
        let mut conn = self.connection().await?;
        let removed: i64 = conn.del(key).await.map_err(unavailable)?;
        Ok(removed > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ttl_rounds_up_to_one_second() {
        assert_eq!(ttl_secs(Duration::from_millis(10)), 1);
        assert_eq!(ttl_secs(Duration::ZERO), 1);
        assert_eq!(ttl_secs(Duration::from_secs(60)), 60);
    }

    #[test]
    fn test_fractional_ttl_rounds_up() {
        assert_eq!(ttl_secs(Duration::from_millis(1500)), 2);
        assert_eq!(ttl_secs(Duration::from_millis(60_001)), 61);
    }

    #[test]
    fn test_invalid_url_is_unavailable() {
        let err = RedisCacheBackend::from_url("not a url").err().unwrap();
        assert!(err.is_cache_error());
    }
}
