//! PostgreSQL graph adapter.
//!
//! Reads the `word` and `synonymlink` tables through a deadpool-postgres
//! pool. Link rows are ordered pairs; `neighbors` unions both join
//! directions so callers always see the symmetric relation.

use std::future::Future;
use std::time::Duration;

use async_trait::async_trait;
use deadpool_postgres::{
    Config, ManagerConfig, Pool, PoolConfig, RecyclingMethod, Runtime, Timeouts,
};
use thesaurus_core::{StorageError, ThesaurusError, ThesaurusResult, Word, WordId, WordKey};
use tokio_postgres::{NoTls, Row};

use super::GraphStore;

const LOOKUP_WORD_SQL: &str = "SELECT id::BIGINT, word FROM word WHERE word = $1 LIMIT 1";

const NEIGHBORS_SQL: &str = "\
SELECT w.id::BIGINT, w.word FROM word w
WHERE w.id IN (
    SELECT synonym_id FROM synonymlink WHERE word_id = $1::BIGINT
    UNION
    SELECT word_id FROM synonymlink WHERE synonym_id = $1::BIGINT
)
AND w.id <> $1::BIGINT";

const SCHEMA_SQL: &str = "\
CREATE TABLE IF NOT EXISTS word (
    id BIGSERIAL PRIMARY KEY,
    word TEXT NOT NULL UNIQUE
);
CREATE TABLE IF NOT EXISTS synonymlink (
    word_id BIGINT NOT NULL REFERENCES word(id),
    synonym_id BIGINT NOT NULL REFERENCES word(id),
    PRIMARY KEY (word_id, synonym_id)
);
CREATE INDEX IF NOT EXISTS synonymlink_synonym_id_idx ON synonymlink (synonym_id);";

// ============================================================================
// CONNECTION POOL CONFIGURATION
// ============================================================================

/// Database connection pool configuration.
#[derive(Debug, Clone)]
pub struct DbConfig {
    /// PostgreSQL host
    pub host: String,
    /// PostgreSQL port
    pub port: u16,
    /// Database name
    pub dbname: String,
    /// Database user
    pub user: String,
    /// Database password
    pub password: String,
    /// Maximum pool size
    pub max_size: usize,
    /// Bound on pool checkout and on each query
    pub timeout: Duration,
}

impl Default for DbConfig {
    fn default() -> Self {
        Self {
            host: "localhost".to_string(),
            port: 5432,
            dbname: "thesaurus".to_string(),
            user: "postgres".to_string(),
            password: "".to_string(),
            max_size: 16,
            timeout: Duration::from_secs(30),
        }
    }
}

impl DbConfig {
    /// Create a new database configuration from environment variables.
    pub fn from_env() -> Self {
        Self {
            host: std::env::var("THESAURUS_DB_HOST").unwrap_or_else(|_| "localhost".to_string()),
            port: std::env::var("THESAURUS_DB_PORT")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(5432),
            dbname: std::env::var("THESAURUS_DB_NAME").unwrap_or_else(|_| "thesaurus".to_string()),
            user: std::env::var("THESAURUS_DB_USER").unwrap_or_else(|_| "postgres".to_string()),
            password: std::env::var("THESAURUS_DB_PASSWORD").unwrap_or_default(),
            max_size: std::env::var("THESAURUS_DB_POOL_SIZE")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(16),
            timeout: Duration::from_secs(
                std::env::var("THESAURUS_DB_TIMEOUT")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(30),
            ),
        }
    }

    /// Create a connection pool from this configuration.
    pub fn create_pool(&self) -> ThesaurusResult<Pool> {
        let mut cfg = Config::new();
        cfg.host = Some(self.host.clone());
        cfg.port = Some(self.port);
        cfg.dbname = Some(self.dbname.clone());
        cfg.user = Some(self.user.clone());
        cfg.password = Some(self.password.clone());

        cfg.manager = Some(ManagerConfig {
            recycling_method: RecyclingMethod::Fast,
        });

        let mut timeouts = Timeouts::default();
        timeouts.wait = Some(self.timeout);
        timeouts.create = Some(self.timeout);
        timeouts.recycle = Some(self.timeout);
        let mut pool_config = PoolConfig::new(self.max_size);
        pool_config.timeouts = timeouts;
        cfg.pool = Some(pool_config);

        cfg.create_pool(Some(Runtime::Tokio1), NoTls)
            .map_err(|e| unavailable(format!("Failed to create pool: {}", e)))
    }
}

fn unavailable(reason: impl Into<String>) -> ThesaurusError {
    ThesaurusError::Storage(StorageError::Unavailable {
        reason: reason.into(),
    })
}

fn row_to_word(row: &Row) -> ThesaurusResult<Word> {
    let id: i64 = row
        .try_get(0)
        .map_err(|e| unavailable(format!("Malformed word row: {}", e)))?;
    let text: String = row
        .try_get(1)
        .map_err(|e| unavailable(format!("Malformed word row: {}", e)))?;
    Ok(Word::new(WordId::new(id), text))
}

// ============================================================================
// GRAPH STORE
// ============================================================================

/// Graph store backed by PostgreSQL.
#[derive(Clone)]
pub struct PgGraphStore {
    pool: Pool,
    query_timeout: Duration,
}

impl PgGraphStore {
    /// Create a store over an existing pool.
    pub fn new(pool: Pool, query_timeout: Duration) -> Self {
        Self {
            pool,
            query_timeout,
        }
    }

    /// Create a store from configuration.
    pub fn from_config(config: &DbConfig) -> ThesaurusResult<Self> {
        let pool = config.create_pool()?;
        Ok(Self::new(pool, config.timeout))
    }

    /// Create the graph tables if they do not exist yet.
    pub async fn ensure_schema(&self) -> ThesaurusResult<()> {
        let conn = self.get_conn().await?;
        self.bounded(conn.batch_execute(SCHEMA_SQL)).await?;
        tracing::info!("Graph schema ready");
        Ok(())
    }

    /// Get a connection from the pool.
    async fn get_conn(&self) -> ThesaurusResult<deadpool_postgres::Object> {
        self.pool
            .get()
            .await
            .map_err(|e| unavailable(format!("Failed to get connection: {}", e)))
    }

    /// Run a query future under the configured timeout.
    async fn bounded<T, F>(&self, query: F) -> ThesaurusResult<T>
    where
        F: Future<Output = Result<T, tokio_postgres::Error>>,
    {
        match tokio::time::timeout(self.query_timeout, query).await {
            Ok(result) => result.map_err(|e| unavailable(format!("Query failed: {}", e))),
            Err(_) => Err(ThesaurusError::Storage(StorageError::Timeout {
                after: self.query_timeout,
            })),
        }
    }
}

#[async_trait]
impl GraphStore for PgGraphStore {
    async fn lookup_word(&self, key: &WordKey) -> ThesaurusResult<Option<Word>> {
        let conn = self.get_conn().await?;
        let text = key.as_str();
        let row = self.bounded(conn.query_opt(LOOKUP_WORD_SQL, &[&text])).await?;
        row.as_ref().map(row_to_word).transpose()
    }

    async fn neighbors(&self, id: WordId) -> ThesaurusResult<Vec<Word>> {
        let conn = self.get_conn().await?;
        let raw_id = id.as_i64();
        let rows = self.bounded(conn.query(NEIGHBORS_SQL, &[&raw_id])).await?;
        rows.iter().map(row_to_word).collect()
    }
}
