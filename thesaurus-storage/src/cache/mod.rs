//! Cache tiers in front of the synonym graph.
//!
//! Two tiers share one [`CacheTier`] contract:
//!
//! - [`LocalTier`]: per-process LRU, bounded by entry count, no expiry.
//! - [`DistributedTier`]: shared between processes, bounded by TTL, reached
//!   through a [`SharedCacheBackend`] substrate (Redis, LMDB or in-memory).
//!
//! The resolver walks tiers fastest first. A tier failure is a miss, never a
//! failed lookup.
//!
//! # Example
//!
//! ```ignore
//! let local: Arc<dyn CacheTier> = Arc::new(LocalTier::new(10)?);
//! let shared: Arc<dyn CacheTier> = Arc::new(DistributedTier::new(
//!     Arc::new(RedisCacheBackend::new("localhost", 6379, 0)?),
//!     Duration::from_secs(60),
//!     Duration::from_millis(500),
//! ));
//! let resolver = SynonymResolver::new(graph, vec![local, shared]);
//! ```

pub mod distributed;
pub mod lmdb_backend;
pub mod local;
pub mod memory_backend;
pub mod redis_backend;
pub mod traits;

pub use distributed::{DistributedTier, KEY_PREFIX};
pub use lmdb_backend::{LmdbCacheBackend, LmdbCacheError};
pub use local::LocalTier;
pub use memory_backend::InMemorySharedBackend;
pub use redis_backend::RedisCacheBackend;
pub use traits::{CacheStats, CacheTier, SharedCacheBackend};
