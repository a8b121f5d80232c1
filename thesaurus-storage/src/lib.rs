//! Thesaurus Storage - Graph Adapters, Cache Tiers and Resolver
//!
//! The graph is the source of truth; the cache tiers in front of it only ever
//! hold clusters previously computed from it.
//!
//! - [`graph`]: the [`GraphStore`] contract with in-memory and PostgreSQL adapters.
//! - [`traversal`]: breadth-first cluster collection over any `GraphStore`.
//! - [`cache`]: local LRU and distributed TTL tiers.
//! - [`resolver`]: [`SynonymResolver`], which ties the three together.

pub mod cache;
pub mod graph;
pub mod resolver;
pub mod traversal;

pub use cache::{
    CacheStats, CacheTier, DistributedTier, InMemorySharedBackend, LmdbCacheBackend,
    LmdbCacheError, LocalTier, RedisCacheBackend, SharedCacheBackend,
};
pub use graph::{DbConfig, GraphStore, InMemoryGraph, PgGraphStore};
pub use resolver::SynonymResolver;
pub use traversal::{collect_cluster, resolve_cluster};
