//! Thesaurus Core - Synonym Graph Types
//!
//! Pure data structures shared by the storage, cache and API crates, plus the
//! error taxonomy and resolver configuration. No I/O lives here.

mod config;
mod error;

pub use config::{DistributedBackend, DistributedTierConfig, LocalTierConfig, ResolverConfig};
pub use error::{CacheError, ConfigError, StorageError, ThesaurusError, ThesaurusResult};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Timestamp type using UTC timezone.
pub type Timestamp = DateTime<Utc>;

// ============================================================================
// GRAPH TYPES
// ============================================================================

/// Stable identifier of a word node (the `word.id` column).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct WordId(i64);

impl WordId {
    pub const fn new(raw: i64) -> Self {
        Self(raw)
    }

    pub fn as_i64(&self) -> i64 {
        self.0
    }
}

impl fmt::Display for WordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A word node. Text is stored normalized and is unique across the graph.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Word {
    pub id: WordId,
    pub text: String,
}

impl Word {
    pub fn new(id: WordId, text: impl Into<String>) -> Self {
        Self {
            id,
            text: text.into(),
        }
    }
}

/// An edge between two words, stored as an ordered pair.
///
/// The relation is symmetric: a link from A to B also links B to A.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SynonymLink {
    pub word_id: WordId,
    pub synonym_id: WordId,
}

impl SynonymLink {
    pub fn new(word_id: WordId, synonym_id: WordId) -> Self {
        Self {
            word_id,
            synonym_id,
        }
    }

    /// Self-loops carry no synonym information.
    pub fn is_self_loop(&self) -> bool {
        self.word_id == self.synonym_id
    }

    /// The endpoint opposite `id`, if this link touches `id` at all.
    pub fn other_end(&self, id: WordId) -> Option<WordId> {
        if self.word_id == id {
            Some(self.synonym_id)
        } else if self.synonym_id == id {
            Some(self.word_id)
        } else {
            None
        }
    }
}

// ============================================================================
// KEYS
// ============================================================================

/// Canonical lookup key: the trimmed, case-folded form of a word.
///
/// The inner string is private, so a key can only be produced through
/// [`WordKey::normalize`]. Every cache tier and graph lookup takes a
/// `WordKey`, which keeps `"HAPPY "` and `"happy"` on the same entry.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct WordKey(String);

impl WordKey {
    /// Normalize raw caller input into a key.
    pub fn normalize(raw: &str) -> Self {
        Self(raw.trim().to_lowercase())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl fmt::Display for WordKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for WordKey {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

// ============================================================================
// CLUSTERS AND CACHE ENTRIES
// ============================================================================

/// Every word transitively linked to `word`, excluding `word` itself.
///
/// Members are unique. Their order is whatever the traversal produced and
/// carries no meaning.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SynonymCluster {
    pub word: String,
    pub members: Vec<String>,
}

impl SynonymCluster {
    pub fn new(word: impl Into<String>, members: Vec<String>) -> Self {
        Self {
            word: word.into(),
            members,
        }
    }

    pub fn contains(&self, text: &str) -> bool {
        self.members.iter().any(|m| m == text)
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }
}

/// Which cache layer a tier occupies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TierKind {
    /// In-process LRU.
    Local,
    /// Shared, TTL-bounded cache.
    Distributed,
}

impl TierKind {
    /// Provenance reported when this tier serves a lookup.
    pub fn hit_provenance(&self) -> Provenance {
        match self {
            TierKind::Local => Provenance::HitLocal,
            TierKind::Distributed => Provenance::HitDistributed,
        }
    }
}

impl fmt::Display for TierKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TierKind::Local => f.write_str("local"),
            TierKind::Distributed => f.write_str("distributed"),
        }
    }
}

/// Which component satisfied a lookup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Provenance {
    HitLocal,
    HitDistributed,
    Computed,
}

impl Provenance {
    /// True when a cache tier answered.
    pub fn cache_flag(&self) -> bool {
        !matches!(self, Provenance::Computed)
    }

    /// Client-facing name of the tier that answered, if any.
    pub fn cache_label(&self) -> Option<&'static str> {
        match self {
            Provenance::HitLocal => Some("LRUCache"),
            Provenance::HitDistributed => Some("Redis"),
            Provenance::Computed => None,
        }
    }
}

/// A cached cluster. Entries are replaced wholesale, never patched.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheEntry {
    pub key: String,
    pub synonyms: Vec<String>,
    /// Where the value came from before landing in this tier.
    pub produced_by: Provenance,
    pub cached_at: Timestamp,
}

impl CacheEntry {
    /// Entry for a cluster freshly computed from the graph.
    pub fn computed(key: &WordKey, synonyms: Vec<String>) -> Self {
        Self {
            key: key.as_str().to_string(),
            synonyms,
            produced_by: Provenance::Computed,
            cached_at: Utc::now(),
        }
    }

    /// Copy of this entry for a tier above the one it was read from.
    pub fn promoted_from(&self, tier: TierKind) -> Self {
        Self {
            key: self.key.clone(),
            synonyms: self.synonyms.clone(),
            produced_by: tier.hit_provenance(),
            cached_at: Utc::now(),
        }
    }
}

/// Outcome of a successful lookup.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Resolution {
    /// The normalized query word.
    pub word: String,
    pub synonyms: Vec<String>,
    pub provenance: Provenance,
}

impl Resolution {
    pub fn cache_flag(&self) -> bool {
        self.provenance.cache_flag()
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_word_key_trims_and_folds_case() {
        assert_eq!(WordKey::normalize("  HaPPy \t").as_str(), "happy");
        assert_eq!(WordKey::normalize("HAPPY "), WordKey::normalize("happy"));
    }

    #[test]
    fn test_word_key_blank_input_is_empty() {
        assert!(WordKey::normalize("   ").is_empty());
    }

    #[test]
    fn test_synonym_link_other_end() {
        let link = SynonymLink::new(WordId::new(1), WordId::new(2));
        assert_eq!(link.other_end(WordId::new(1)), Some(WordId::new(2)));
        assert_eq!(link.other_end(WordId::new(2)), Some(WordId::new(1)));
        assert_eq!(link.other_end(WordId::new(3)), None);
        assert!(!link.is_self_loop());
        assert!(SynonymLink::new(WordId::new(4), WordId::new(4)).is_self_loop());
    }

    #[test]
    fn test_provenance_flags_and_labels() {
        assert!(Provenance::HitLocal.cache_flag());
        assert!(Provenance::HitDistributed.cache_flag());
        assert!(!Provenance::Computed.cache_flag());

        assert_eq!(Provenance::HitLocal.cache_label(), Some("LRUCache"));
        assert_eq!(Provenance::HitDistributed.cache_label(), Some("Redis"));
        assert_eq!(Provenance::Computed.cache_label(), None);
    }

    #[test]
    fn test_tier_kind_hit_provenance() {
        assert_eq!(TierKind::Local.hit_provenance(), Provenance::HitLocal);
        assert_eq!(
            TierKind::Distributed.hit_provenance(),
            Provenance::HitDistributed
        );
    }

    #[test]
    fn test_cache_entry_promotion_keeps_value() {
        let key = WordKey::normalize("happy");
        let entry = CacheEntry::computed(&key, vec!["joyful".to_string()]);
        assert_eq!(entry.produced_by, Provenance::Computed);

        let promoted = entry.promoted_from(TierKind::Distributed);
        assert_eq!(promoted.key, "happy");
        assert_eq!(promoted.synonyms, entry.synonyms);
        assert_eq!(promoted.produced_by, Provenance::HitDistributed);
    }

    #[test]
    fn test_cache_entry_json_shape() {
        let key = WordKey::normalize("happy");
        let entry = CacheEntry::computed(&key, vec!["cheerful".to_string()]);
        let json = serde_json::to_value(&entry).unwrap();
        assert_eq!(json["key"], "happy");
        assert_eq!(json["produced_by"], "computed");
        assert_eq!(json["synonyms"][0], "cheerful");
    }

    #[test]
    fn test_cluster_contains() {
        let cluster = SynonymCluster::new("happy", vec!["joyful".into(), "cheerful".into()]);
        assert!(cluster.contains("joyful"));
        assert!(!cluster.contains("happy"));
        assert_eq!(cluster.len(), 2);
        assert!(!cluster.is_empty());
    }
}
