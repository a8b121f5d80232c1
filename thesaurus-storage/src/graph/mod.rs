//! Read-only access to the synonym graph.
//!
//! Adapters expose word lookup by normalized text and the symmetric
//! neighbor relation. A missing word is `Ok(None)`; an unreachable store
//! is a [`StorageError`](thesaurus_core::StorageError).

pub mod memory;
pub mod postgres;

pub use memory::InMemoryGraph;
pub use postgres::{DbConfig, PgGraphStore};

use async_trait::async_trait;
use thesaurus_core::{ThesaurusResult, Word, WordId, WordKey};

/// Graph store trait for synonym lookups.
///
/// Implementations must be safe to call concurrently and must treat every
/// stored link as pointing both ways.
#[async_trait]
pub trait GraphStore: Send + Sync {
    /// Find the node whose text equals `key`.
    async fn lookup_word(&self, key: &WordKey) -> ThesaurusResult<Option<Word>>;

    /// Every node linked to `id` in either direction, without duplicates.
    async fn neighbors(&self, id: WordId) -> ThesaurusResult<Vec<Word>>;
}
