//! Thesaurus Test Utilities
//!
//! Centralized test infrastructure for the thesaurus workspace:
//! - Mock graph stores and cache tiers with failure injection
//! - Proptest generators for synonym graphs
//! - Test fixtures for common scenarios
//! - Custom assertions for resolver results

// Re-export core types for convenience
pub use thesaurus_core::{
    CacheEntry, CacheError, ConfigError, DistributedBackend, Provenance, Resolution,
    ResolverConfig, StorageError, SynonymCluster, SynonymLink, ThesaurusError, ThesaurusResult,
    TierKind, Word, WordId, WordKey,
};
pub use thesaurus_storage::{
    CacheStats, CacheTier, DistributedTier, GraphStore, InMemoryGraph, InMemorySharedBackend,
    LocalTier, SharedCacheBackend, SynonymResolver,
};

use std::collections::{BTreeSet, HashMap, HashSet, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;

// ============================================================================
// MOCK STORES AND TIERS
// ============================================================================

/// Graph wrapper counting calls into the inner store.
pub struct CountingGraph<G> {
    inner: G,
    lookups: AtomicUsize,
    expansions: AtomicUsize,
}

impl<G: GraphStore> CountingGraph<G> {
    pub fn new(inner: G) -> Self {
        Self {
            inner,
            lookups: AtomicUsize::new(0),
            expansions: AtomicUsize::new(0),
        }
    }

    pub fn inner(&self) -> &G {
        &self.inner
    }

    /// Number of `lookup_word` calls, i.e. graph traversals started.
    pub fn lookups(&self) -> usize {
        self.lookups.load(Ordering::SeqCst)
    }

    /// Number of `neighbors` calls.
    pub fn expansions(&self) -> usize {
        self.expansions.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl<G: GraphStore> GraphStore for CountingGraph<G> {
    async fn lookup_word(&self, key: &WordKey) -> ThesaurusResult<Option<Word>> {
        self.lookups.fetch_add(1, Ordering::SeqCst);
        self.inner.lookup_word(key).await
    }

    async fn neighbors(&self, id: WordId) -> ThesaurusResult<Vec<Word>> {
        self.expansions.fetch_add(1, Ordering::SeqCst);
        self.inner.neighbors(id).await
    }
}

/// Graph store that is always down.
#[derive(Debug, Clone, Default)]
pub struct UnavailableGraph;

#[async_trait]
impl GraphStore for UnavailableGraph {
    async fn lookup_word(&self, _key: &WordKey) -> ThesaurusResult<Option<Word>> {
        Err(StorageError::Unavailable {
            reason: "graph store offline".to_string(),
        }
        .into())
    }

    async fn neighbors(&self, _id: WordId) -> ThesaurusResult<Vec<Word>> {
        Err(StorageError::Unavailable {
            reason: "graph store offline".to_string(),
        }
        .into())
    }
}

/// Distributed substrate that refuses every call, like an unreachable server.
#[derive(Debug, Clone, Default)]
pub struct UnavailableBackend;

fn refused() -> ThesaurusError {
    ThesaurusError::Cache(CacheError::Unavailable {
        tier: TierKind::Distributed,
        reason: "connection refused".to_string(),
    })
}

#[async_trait]
impl SharedCacheBackend for UnavailableBackend {
    fn name(&self) -> &'static str {
        "unavailable"
    }

    async fn fetch(&self, _key: &str) -> ThesaurusResult<Option<Vec<u8>>> {
        Err(refused())
    }

    async fn store(&self, _key: &str, _value: Vec<u8>, _ttl: Duration) -> ThesaurusResult<()> {
        Err(refused())
    }

    async fn remove(&self, _key: &str) -> ThesaurusResult<bool> {
        Err(refused())
    }
}

// ============================================================================
// PROPTEST GENERATORS
// ============================================================================

/// A generated graph: distinct words plus links between them by index.
///
/// Kept separate from [`InMemoryGraph`] so tests can compute expected
/// clusters independently of the code under test.
#[derive(Debug, Clone)]
pub struct GraphSpec {
    pub words: Vec<String>,
    pub links: Vec<(usize, usize)>,
}

impl GraphSpec {
    /// Materialize the spec as an in-memory graph.
    pub fn build(&self) -> InMemoryGraph {
        let graph = InMemoryGraph::new();
        for word in &self.words {
            graph.add_word(word);
        }
        for &(a, b) in &self.links {
            graph.add_link(&self.words[a], &self.words[b]);
        }
        graph
    }

    /// Expected cluster of `word`, sorted, computed over the spec itself.
    pub fn expected_cluster(&self, word: &str) -> Option<Vec<String>> {
        let start = self.words.iter().position(|w| w == word)?;

        let mut adjacency: HashMap<usize, Vec<usize>> = HashMap::new();
        for &(a, b) in &self.links {
            adjacency.entry(a).or_default().push(b);
            adjacency.entry(b).or_default().push(a);
        }

        let mut seen = HashSet::from([start]);
        let mut queue = VecDeque::from([start]);
        while let Some(i) = queue.pop_front() {
            for &n in adjacency.get(&i).into_iter().flatten() {
                if seen.insert(n) {
                    queue.push_back(n);
                }
            }
        }

        let mut members: Vec<String> = seen
            .into_iter()
            .filter(|&i| i != start)
            .map(|i| self.words[i].clone())
            .collect();
        members.sort();
        Some(members)
    }
}

pub mod generators {
    //! Proptest strategies for generating synonym graphs.

    use super::*;
    use proptest::prelude::*;

    /// Generate a lowercase word.
    pub fn arb_word() -> impl Strategy<Value = String> {
        "[a-z]{2,10}"
    }

    /// Generate a word with random case and surrounding whitespace.
    pub fn arb_noisy_spelling(word: String) -> impl Strategy<Value = String> {
        (
            prop::collection::vec(any::<bool>(), word.len()),
            "[ \\t]{0,3}",
            "[ \\t]{0,3}",
        )
            .prop_map(move |(upper, left, right)| {
                let body: String = word
                    .chars()
                    .zip(upper)
                    .map(|(c, up)| if up { c.to_ascii_uppercase() } else { c })
                    .collect();
                format!("{}{}{}", left, body, right)
            })
    }

    /// Generate a graph of up to `max_words` distinct words with random links.
    ///
    /// Self-loops and duplicate links are allowed; the graph must tolerate both.
    pub fn arb_graph(max_words: usize) -> impl Strategy<Value = GraphSpec> {
        prop::collection::btree_set(arb_word(), 1..=max_words.max(1)).prop_flat_map(
            |words: BTreeSet<String>| {
                let words: Vec<String> = words.into_iter().collect();
                let n = words.len();
                let max_links = n * 2;
                prop::collection::vec((0..n, 0..n), 0..=max_links)
                    .prop_map(move |links| GraphSpec {
                        words: words.clone(),
                        links,
                    })
            },
        )
    }

    /// Generate a graph together with one of its words.
    pub fn arb_graph_and_word(max_words: usize) -> impl Strategy<Value = (GraphSpec, String)> {
        arb_graph(max_words).prop_flat_map(|spec| {
            let n = spec.words.len();
            (Just(spec), 0..n).prop_map(|(spec, i)| {
                let word = spec.words[i].clone();
                (spec, word)
            })
        })
    }
}

// ============================================================================
// TEST FIXTURES
// ============================================================================

pub mod fixtures {
    //! Pre-built test fixtures for common testing scenarios.

    use super::*;

    /// Links of the canonical "happy" star.
    pub const HAPPY_LINKS: [(&str, &str); 3] = [
        ("happy", "cheerful"),
        ("happy", "joyful"),
        ("happy", "optimistic"),
    ];

    /// happy linked to cheerful, joyful and optimistic.
    pub fn happy_graph() -> InMemoryGraph {
        InMemoryGraph::from_pairs(HAPPY_LINKS)
    }

    /// Short TTL and timeout suitable for tests.
    pub fn test_resolver_config() -> ResolverConfig {
        ResolverConfig::new()
            .with_local_capacity(10)
            .with_ttl(Duration::from_secs(60))
            .with_op_timeout(Duration::from_millis(200))
            .with_backend(DistributedBackend::Memory)
    }

    /// Distributed tier over an in-memory substrate.
    pub fn memory_distributed_tier(backend: Arc<InMemorySharedBackend>) -> Arc<dyn CacheTier> {
        Arc::new(DistributedTier::new(
            backend,
            Duration::from_secs(60),
            Duration::from_millis(200),
        ))
    }

    /// Resolver with a local tier of `capacity` and an in-memory distributed tier.
    pub fn two_tier_resolver(graph: Arc<dyn GraphStore>, capacity: usize) -> SynonymResolver {
        let local: Arc<dyn CacheTier> = Arc::new(
            LocalTier::new(capacity).unwrap_or_else(|e| panic!("invalid test capacity: {}", e)),
        );
        let shared = memory_distributed_tier(Arc::new(InMemorySharedBackend::new()));
        SynonymResolver::new(graph, vec![local, shared])
    }

    /// Resolver whose distributed substrate is unreachable.
    pub fn degraded_resolver(graph: Arc<dyn GraphStore>) -> SynonymResolver {
        let local: Arc<dyn CacheTier> = Arc::new(
            LocalTier::new(10).unwrap_or_else(|e| panic!("invalid test capacity: {}", e)),
        );
        let shared: Arc<dyn CacheTier> = Arc::new(DistributedTier::new(
            Arc::new(UnavailableBackend),
            Duration::from_secs(60),
            Duration::from_millis(200),
        ));
        SynonymResolver::new(graph, vec![local, shared])
    }
}

// ============================================================================
// CUSTOM ASSERTIONS
// ============================================================================

pub mod assertions {
    //! Custom assertion functions for resolver results.

    use super::*;

    /// Sorted copy of a member list.
    pub fn sorted(members: &[String]) -> Vec<String> {
        let mut members = members.to_vec();
        members.sort();
        members
    }

    /// Assert a resolution holds exactly `expected`, in any order.
    #[track_caller]
    pub fn assert_members(resolution: &Resolution, expected: &[&str]) {
        let mut expected: Vec<String> = expected.iter().map(|s| s.to_string()).collect();
        expected.sort();
        assert_eq!(sorted(&resolution.synonyms), expected);
    }

    /// Assert that a lookup was answered by a cache tier.
    #[track_caller]
    pub fn assert_cache_hit(resolution: &Resolution) {
        assert!(
            resolution.cache_flag(),
            "Expected a cache hit, got {:?}",
            resolution.provenance
        );
    }

    /// Assert that a ThesaurusResult is a Storage error.
    #[track_caller]
    pub fn assert_storage_error<T: std::fmt::Debug>(result: &ThesaurusResult<T>) {
        match result {
            Err(ThesaurusError::Storage(_)) => {}
            other => panic!("Expected Storage error, got: {:?}", other),
        }
    }

    /// Assert that a ThesaurusResult is a Config error.
    #[track_caller]
    pub fn assert_config_error<T: std::fmt::Debug>(result: &ThesaurusResult<T>) {
        match result {
            Err(ThesaurusError::Config(_)) => {}
            other => panic!("Expected Config error, got: {:?}", other),
        }
    }
}

// ============================================================================
// TESTS
// ============================================================================
