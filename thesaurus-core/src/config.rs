//! Resolver configuration
//!
//! Loaded from `THESAURUS_*` environment variables with development defaults,
//! then validated once at startup.

use crate::{ConfigError, ThesaurusError, ThesaurusResult};
use std::env::VarError;
use std::fmt::Display;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

/// Local (in-process LRU) tier settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocalTierConfig {
    pub enabled: bool,
    /// Maximum number of cached words.
    pub capacity: usize,
}

impl Default for LocalTierConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            capacity: 10,
        }
    }
}

/// Substrate behind the distributed tier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DistributedBackend {
    /// Redis reachable over the network.
    Redis { host: String, port: u16, db: i64 },
    /// LMDB environment shared by every process on the host.
    Lmdb { path: PathBuf, max_size_mb: usize },
    /// Process-local map with expiry; for tests and single-node development.
    Memory,
}

impl DistributedBackend {
    /// Parse a backend name (`redis`, `lmdb`, `memory`) using the remaining
    /// environment for connection details.
    fn from_env_name(name: &str) -> ThesaurusResult<Self> {
        match name.trim().to_lowercase().as_str() {
            "redis" => Ok(Self::Redis {
                host: env_string("THESAURUS_REDIS_HOST", "localhost"),
                port: env_parse("THESAURUS_REDIS_PORT", 6379)?,
                db: env_parse("THESAURUS_REDIS_DB", 0)?,
            }),
            "lmdb" => Ok(Self::Lmdb {
                path: PathBuf::from(env_string("THESAURUS_LMDB_PATH", "./.thesaurus-cache")),
                max_size_mb: env_parse("THESAURUS_LMDB_MAX_SIZE_MB", 64)?,
            }),
            "memory" => Ok(Self::Memory),
            other => Err(invalid(
                "THESAURUS_DISTRIBUTED_CACHE_BACKEND",
                other,
                "expected one of redis, lmdb, memory",
            )),
        }
    }

    /// Short name used in logs.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Redis { .. } => "redis",
            Self::Lmdb { .. } => "lmdb",
            Self::Memory => "memory",
        }
    }
}

/// Distributed (shared) tier settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DistributedTierConfig {
    pub enabled: bool,
    /// Lifetime of each written entry.
    pub ttl: Duration,
    /// Upper bound on a single substrate round-trip.
    pub op_timeout: Duration,
    pub backend: DistributedBackend,
}

impl Default for DistributedTierConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            ttl: Duration::from_secs(60),
            op_timeout: Duration::from_millis(500),
            backend: DistributedBackend::Redis {
                host: "localhost".to_string(),
                port: 6379,
                db: 0,
            },
        }
    }
}

/// Configuration for the tier chain in front of the graph.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ResolverConfig {
    pub local: LocalTierConfig,
    pub distributed: DistributedTierConfig,
}

impl ResolverConfig {
    /// Create a config with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Both tiers off: every lookup traverses the graph.
    pub fn uncached() -> Self {
        Self::default()
            .with_local_enabled(false)
            .with_distributed_enabled(false)
    }

    /// Load configuration from environment variables.
    ///
    /// A variable that is set but does not parse is a
    /// [`ConfigError::InvalidValue`]; only unset variables fall back to the
    /// default. Flags accept `true`/`false`, `1`/`0` and `yes`/`no`.
    ///
    /// Environment variables:
    /// - `THESAURUS_LRU_CACHE_ENABLED`: "true" or "false" (default: true)
    /// - `THESAURUS_LRU_CACHE_SIZE`: local capacity (default: 10)
    /// - `THESAURUS_DISTRIBUTED_CACHE_ENABLED`: "true" or "false" (default: true)
    /// - `THESAURUS_DISTRIBUTED_CACHE_BACKEND`: redis, lmdb or memory (default: redis)
    /// - `THESAURUS_CACHE_TTL_SECS`: distributed entry TTL (default: 60)
    /// - `THESAURUS_CACHE_TIMEOUT_MS`: per-call substrate timeout (default: 500)
    /// - `THESAURUS_REDIS_HOST` / `THESAURUS_REDIS_PORT` / `THESAURUS_REDIS_DB`
    /// - `THESAURUS_LMDB_PATH` / `THESAURUS_LMDB_MAX_SIZE_MB`
    pub fn from_env() -> ThesaurusResult<Self> {
        let local = LocalTierConfig {
            enabled: env_flag("THESAURUS_LRU_CACHE_ENABLED", true)?,
            capacity: env_parse("THESAURUS_LRU_CACHE_SIZE", 10)?,
        };

        let backend_name = env_string("THESAURUS_DISTRIBUTED_CACHE_BACKEND", "redis");
        let distributed = DistributedTierConfig {
            enabled: env_flag("THESAURUS_DISTRIBUTED_CACHE_ENABLED", true)?,
            ttl: Duration::from_secs(env_parse("THESAURUS_CACHE_TTL_SECS", 60)?),
            op_timeout: Duration::from_millis(env_parse("THESAURUS_CACHE_TIMEOUT_MS", 500)?),
            backend: DistributedBackend::from_env_name(&backend_name)?,
        };

        let config = Self { local, distributed };
        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration.
    pub fn validate(&self) -> ThesaurusResult<()> {
        if self.local.enabled && self.local.capacity == 0 {
            return Err(ThesaurusError::Config(ConfigError::InvalidValue {
                field: "local.capacity".to_string(),
                value: self.local.capacity.to_string(),
                reason: "capacity must be greater than 0 while the local tier is enabled"
                    .to_string(),
            }));
        }

        if self.distributed.enabled && self.distributed.ttl.is_zero() {
            return Err(ThesaurusError::Config(ConfigError::InvalidValue {
                field: "distributed.ttl".to_string(),
                value: format!("{:?}", self.distributed.ttl),
                reason: "ttl must be positive while the distributed tier is enabled".to_string(),
            }));
        }

        if self.distributed.enabled && self.distributed.op_timeout.is_zero() {
            return Err(ThesaurusError::Config(ConfigError::InvalidValue {
                field: "distributed.op_timeout".to_string(),
                value: format!("{:?}", self.distributed.op_timeout),
                reason: "op_timeout must be positive".to_string(),
            }));
        }

        Ok(())
    }

    /// Enable or disable the local tier.
    pub fn with_local_enabled(mut self, enabled: bool) -> Self {
        self.local.enabled = enabled;
        self
    }

    /// Set the local tier capacity.
    pub fn with_local_capacity(mut self, capacity: usize) -> Self {
        self.local.capacity = capacity;
        self
    }

    /// Enable or disable the distributed tier.
    pub fn with_distributed_enabled(mut self, enabled: bool) -> Self {
        self.distributed.enabled = enabled;
        self
    }

    /// Set the distributed entry TTL.
    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.distributed.ttl = ttl;
        self
    }

    /// Set the distributed round-trip timeout.
    pub fn with_op_timeout(mut self, timeout: Duration) -> Self {
        self.distributed.op_timeout = timeout;
        self
    }

    /// Set the distributed substrate.
    pub fn with_backend(mut self, backend: DistributedBackend) -> Self {
        self.distributed.backend = backend;
        self
    }
}

fn env_string(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

fn invalid(key: &str, raw: &str, reason: impl Into<String>) -> ThesaurusError {
    ThesaurusError::Config(ConfigError::InvalidValue {
        field: key.to_string(),
        value: raw.to_string(),
        reason: reason.into(),
    })
}

/// `None` when unset; a non-unicode value is rejected rather than ignored.
fn env_raw(key: &str) -> ThesaurusResult<Option<String>> {
    match std::env::var(key) {
        Ok(raw) => Ok(Some(raw)),
        Err(VarError::NotPresent) => Ok(None),
        Err(VarError::NotUnicode(raw)) => {
            Err(invalid(key, &raw.to_string_lossy(), "value is not valid unicode"))
        }
    }
}

fn parse_value<T>(key: &str, raw: Option<&str>, default: T) -> ThesaurusResult<T>
where
    T: FromStr,
    T::Err: Display,
{
    match raw {
        None => Ok(default),
        Some(raw) => raw.trim().parse().map_err(|e: T::Err| invalid(key, raw, e.to_string())),
    }
}

fn parse_flag(key: &str, raw: Option<&str>, default: bool) -> ThesaurusResult<bool> {
    let Some(raw) = raw else {
        return Ok(default);
    };
    match raw.trim().to_lowercase().as_str() {
        "true" | "1" | "yes" => Ok(true),
        "false" | "0" | "no" => Ok(false),
        _ => Err(invalid(key, raw, "expected true/false, 1/0 or yes/no")),
    }
}

fn env_parse<T>(key: &str, default: T) -> ThesaurusResult<T>
where
    T: FromStr,
    T::Err: Display,
{
    parse_value(key, env_raw(key)?.as_deref(), default)
}

fn env_flag(key: &str, default: bool) -> ThesaurusResult<bool> {
    parse_flag(key, env_raw(key)?.as_deref(), default)
}
