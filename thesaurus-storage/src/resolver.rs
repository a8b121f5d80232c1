//! Synonym resolution through the tier chain.
//!
//! Lookup order is strict: each tier is consulted fastest first and the
//! first hit wins. A hit is copied into every tier above the one that
//! answered, never below it. A full miss traverses the graph and writes the
//! cluster to every tier. Words absent from the graph are never cached.

use std::sync::Arc;

use thesaurus_core::{
    CacheEntry, DistributedBackend, Provenance, Resolution, ResolverConfig, ThesaurusResult,
    TierKind, WordKey,
};
use tracing::Instrument;

use crate::cache::{
    CacheStats, CacheTier, DistributedTier, InMemorySharedBackend, LmdbCacheBackend, LocalTier,
    RedisCacheBackend, SharedCacheBackend,
};
use crate::graph::GraphStore;
use crate::traversal;

/// Resolves words to their synonym clusters.
///
/// Cheap to share: wrap it in an `Arc` and call it from any number of tasks.
/// Concurrent misses on the same word may both traverse and both write; the
/// writes carry the same value.
pub struct SynonymResolver {
    graph: Arc<dyn GraphStore>,
    tiers: Vec<Arc<dyn CacheTier>>,
}

impl SynonymResolver {
    /// Create a resolver over `graph` with tiers in lookup order.
    pub fn new(graph: Arc<dyn GraphStore>, tiers: Vec<Arc<dyn CacheTier>>) -> Self {
        Self { graph, tiers }
    }

    /// Resolver with no cache tiers; every lookup traverses the graph.
    pub fn uncached(graph: Arc<dyn GraphStore>) -> Self {
        Self::new(graph, Vec::new())
    }

    /// Build the tier chain described by `config`.
    ///
    /// The Redis substrate connects lazily, so an unreachable server does not
    /// fail construction. An LMDB path that cannot be opened does.
    pub fn from_config(graph: Arc<dyn GraphStore>, config: &ResolverConfig) -> ThesaurusResult<Self> {
        config.validate()?;

        let mut tiers: Vec<Arc<dyn CacheTier>> = Vec::new();

        if config.local.enabled {
            tiers.push(Arc::new(LocalTier::new(config.local.capacity)?));
        }

        if config.distributed.enabled {
            let backend = open_backend(&config.distributed.backend)?;
            tiers.push(Arc::new(DistributedTier::new(
                backend,
                config.distributed.ttl,
                config.distributed.op_timeout,
            )));
        }

        tracing::info!(
            local = config.local.enabled,
            local_capacity = config.local.capacity,
            distributed = config.distributed.enabled,
            backend = config.distributed.backend.name(),
            "Synonym resolver configured"
        );

        Ok(Self::new(graph, tiers))
    }

    /// Tiers in lookup order.
    pub fn tiers(&self) -> &[Arc<dyn CacheTier>] {
        &self.tiers
    }

    /// Resolve `word` to its cluster.
    ///
    /// Returns `Ok(None)` when the normalized word has no node in the graph.
    /// Cache failures degrade to misses; graph failures are returned.
    pub async fn resolve(&self, word: &str) -> ThesaurusResult<Option<Resolution>> {
        let key = WordKey::normalize(word);
        let span = tracing::debug_span!("resolve", word = %key);
        self.resolve_key(key).instrument(span).await
    }

    async fn resolve_key(&self, key: WordKey) -> ThesaurusResult<Option<Resolution>> {
        if key.is_empty() {
            return Ok(None);
        }

        for (depth, tier) in self.tiers.iter().enumerate() {
            let kind = tier.kind();
            match tier.get(&key).await {
                Ok(Some(entry)) => {
                    tracing::debug!(tier = %kind, "cache hit");
                    self.populate(&self.tiers[..depth], &entry.promoted_from(kind))
                        .await;
                    return Ok(Some(Resolution {
                        word: key.into_string(),
                        synonyms: entry.synonyms,
                        provenance: kind.hit_provenance(),
                    }));
                }
                Ok(None) => tracing::debug!(tier = %kind, "cache miss"),
                Err(e) if e.is_cache_error() => {
                    tracing::warn!(tier = %kind, error = %e, "cache read failed, treating as miss");
                }
                Err(e) => return Err(e),
            }
        }

        let Some(cluster) = traversal::resolve_cluster(self.graph.as_ref(), &key).await? else {
            tracing::debug!("word not in graph");
            return Ok(None);
        };

        tracing::debug!(members = cluster.len(), "cluster computed from graph");
        self.populate(&self.tiers, &CacheEntry::computed(&key, cluster.members.clone()))
            .await;

        Ok(Some(Resolution {
            word: key.into_string(),
            synonyms: cluster.members,
            provenance: Provenance::Computed,
        }))
    }

    /// Write `entry` to each of `tiers`, skipping any that fail.
    async fn populate(&self, tiers: &[Arc<dyn CacheTier>], entry: &CacheEntry) {
        for tier in tiers {
            if let Err(e) = tier.put(entry.clone()).await {
                tracing::warn!(tier = %tier.kind(), error = %e, "cache write failed, skipping tier");
            }
        }
    }

    /// Drop `word` from every tier. Returns how many tiers acknowledged.
    pub async fn invalidate(&self, word: &str) -> usize {
        let key = WordKey::normalize(word);
        if key.is_empty() {
            return 0;
        }

        let mut acknowledged = 0;
        for tier in &self.tiers {
            match tier.invalidate(&key).await {
                Ok(_) => acknowledged += 1,
                Err(e) => {
                    tracing::warn!(tier = %tier.kind(), word = %key, error = %e, "cache invalidation failed");
                }
            }
        }
        acknowledged
    }

    /// Per-tier counters, in lookup order.
    pub fn stats(&self) -> Vec<(TierKind, CacheStats)> {
        self.tiers
            .iter()
            .map(|tier| (tier.kind(), tier.stats()))
            .collect()
    }
}

fn open_backend(backend: &DistributedBackend) -> ThesaurusResult<Arc<dyn SharedCacheBackend>> {
    let backend: Arc<dyn SharedCacheBackend> = match backend {
        DistributedBackend::Redis { host, port, db } => {
            Arc::new(RedisCacheBackend::new(host, *port, *db)?)
        }
        DistributedBackend::Lmdb { path, max_size_mb } => {
            Arc::new(LmdbCacheBackend::new(path, *max_size_mb)?)
        }
        DistributedBackend::Memory => Arc::new(InMemorySharedBackend::new()),
    };
    Ok(backend)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    use async_trait::async_trait;
    use thesaurus_core::{CacheError, StorageError, ThesaurusError, Word, WordId};

    use crate::graph::InMemoryGraph;

    fn happy_graph() -> Arc<InMemoryGraph> {
        Arc::new(InMemoryGraph::from_pairs([
            ("happy", "cheerful"),
            ("happy", "joyful"),
            ("happy", "optimistic"),
        ]))
    }

    fn sorted(mut words: Vec<String>) -> Vec<String> {
        words.sort();
        words
    }

    fn local_tier(capacity: usize) -> Arc<dyn CacheTier> {
        Arc::new(LocalTier::new(capacity).unwrap())
    }

    fn unavailable_tier() -> Arc<dyn CacheTier> {
        Arc::new(UnavailableTier)
    }

    fn shared_tier(backend: Arc<InMemorySharedBackend>) -> Arc<dyn CacheTier> {
        Arc::new(DistributedTier::new(
            backend,
            Duration::from_secs(60),
            Duration::from_millis(200),
        ))
    }

    /// Tier whose substrate is always down.
    struct UnavailableTier;

    fn down() -> ThesaurusError {
        ThesaurusError::Cache(CacheError::Unavailable {
            tier: TierKind::Distributed,
            reason: "connection refused".to_string(),
        })
    }

    #[async_trait]
    impl CacheTier for UnavailableTier {
        fn kind(&self) -> TierKind {
            TierKind::Distributed
        }

        async fn get(&self, _key: &WordKey) -> ThesaurusResult<Option<CacheEntry>> {
            Err(down())
        }

        async fn put(&self, _entry: CacheEntry) -> ThesaurusResult<()> {
            Err(down())
        }

        async fn invalidate(&self, _key: &WordKey) -> ThesaurusResult<bool> {
            Err(down())
        }

        fn stats(&self) -> CacheStats {
            CacheStats::default()
        }
    }

    /// Graph wrapper counting word lookups.
    struct CountingGraph {
        inner: Arc<InMemoryGraph>,
        lookups: AtomicUsize,
    }

    #[async_trait]
    impl GraphStore for CountingGraph {
        async fn lookup_word(&self, key: &WordKey) -> ThesaurusResult<Option<Word>> {
            self.lookups.fetch_add(1, Ordering::SeqCst);
            self.inner.lookup_word(key).await
        }

        async fn neighbors(&self, id: WordId) -> ThesaurusResult<Vec<Word>> {
            self.inner.neighbors(id).await
        }
    }

    struct DownGraph;

    #[async_trait]
    impl GraphStore for DownGraph {
        async fn lookup_word(&self, _key: &WordKey) -> ThesaurusResult<Option<Word>> {
            Err(StorageError::Unavailable {
                reason: "database offline".to_string(),
            }
            .into())
        }

        async fn neighbors(&self, _id: WordId) -> ThesaurusResult<Vec<Word>> {
            Ok(Vec::new())
        }
    }

    #[tokio::test]
    async fn test_happy_scenario() {
        let resolver = SynonymResolver::uncached(happy_graph());

        let happy = resolver.resolve("happy").await.unwrap().unwrap();
        assert_eq!(happy.word, "happy");
        assert_eq!(sorted(happy.synonyms), vec!["cheerful", "joyful", "optimistic"]);
        assert_eq!(happy.provenance, Provenance::Computed);

        let cheerful = resolver.resolve("cheerful").await.unwrap().unwrap();
        assert_eq!(sorted(cheerful.synonyms), vec!["happy", "joyful", "optimistic"]);

        assert!(resolver.resolve("unknownword").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_input_is_normalized() {
        let resolver = SynonymResolver::uncached(happy_graph());
        let padded = resolver.resolve("HAPPY ").await.unwrap().unwrap();
        let plain = resolver.resolve("happy").await.unwrap().unwrap();
        assert_eq!(padded.word, "happy");
        assert_eq!(sorted(padded.synonyms), sorted(plain.synonyms));
    }

    #[tokio::test]
    async fn test_blank_input_is_not_found() {
        let resolver = SynonymResolver::uncached(happy_graph());
        assert!(resolver.resolve("   ").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_isolated_word_has_empty_cluster() {
        let graph = happy_graph();
        graph.add_word("alone");
        let resolver = SynonymResolver::uncached(graph);

        let alone = resolver.resolve("alone").await.unwrap().unwrap();
        assert!(alone.synonyms.is_empty());
    }

    #[tokio::test]
    async fn test_second_lookup_hits_local_tier() {
        let local = local_tier(10);
        let resolver = SynonymResolver::new(happy_graph(), vec![local]);

        let first = resolver.resolve("happy").await.unwrap().unwrap();
        let second = resolver.resolve("happy").await.unwrap().unwrap();

        assert_eq!(first.provenance, Provenance::Computed);
        assert!(!first.cache_flag());
        assert_eq!(second.provenance, Provenance::HitLocal);
        assert!(second.cache_flag());
        assert_eq!(first.synonyms, second.synonyms);
    }

    #[tokio::test]
    async fn test_local_hit_leaves_lower_tier_untouched() {
        let local = local_tier(10);
        let shared = shared_tier(Arc::new(InMemorySharedBackend::new()));
        let resolver = SynonymResolver::new(happy_graph(), vec![local, shared.clone()]);

        resolver.resolve("happy").await.unwrap();
        let before = shared.stats();
        resolver.resolve("happy").await.unwrap();

        assert_eq!(shared.stats(), before);
    }

    #[tokio::test]
    async fn test_distributed_hit_populates_local() {
        let backend = Arc::new(InMemorySharedBackend::new());
        let graph = happy_graph();

        // Another process already computed the word.
        let warm = SynonymResolver::new(graph.clone(), vec![shared_tier(backend.clone())]);
        warm.resolve("happy").await.unwrap();

        let local = Arc::new(LocalTier::new(10).unwrap());
        let resolver = SynonymResolver::new(graph, vec![local.clone() as Arc<dyn CacheTier>, shared_tier(backend)]);

        let first = resolver.resolve("happy").await.unwrap().unwrap();
        assert_eq!(first.provenance, Provenance::HitDistributed);
        assert!(local.contains(&WordKey::normalize("happy")));

        let second = resolver.resolve("happy").await.unwrap().unwrap();
        assert_eq!(second.provenance, Provenance::HitLocal);
        assert_eq!(first.synonyms, second.synonyms);
    }

    #[tokio::test]
    async fn test_computed_cluster_populates_every_tier() {
        let local = Arc::new(LocalTier::new(10).unwrap());
        let backend = Arc::new(InMemorySharedBackend::new());
        let resolver = SynonymResolver::new(
            happy_graph(),
            vec![local.clone() as Arc<dyn CacheTier>, shared_tier(backend.clone())],
        );

        resolver.resolve("joyful").await.unwrap();

        assert!(local.contains(&WordKey::normalize("joyful")));
        assert!(backend.fetch("synonyms:joyful").await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_uncached_resolver_always_recomputes() {
        let graph = Arc::new(CountingGraph {
            inner: happy_graph(),
            lookups: AtomicUsize::new(0),
        });
        let resolver = SynonymResolver::uncached(graph.clone());

        let first = resolver.resolve("happy").await.unwrap().unwrap();
        let second = resolver.resolve("happy").await.unwrap().unwrap();

        assert_eq!(second.provenance, Provenance::Computed);
        assert_eq!(first.synonyms, second.synonyms);
        assert_eq!(graph.lookups.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_not_found_is_never_cached() {
        let graph = happy_graph();
        let local = local_tier(10);
        let shared = shared_tier(Arc::new(InMemorySharedBackend::new()));
        let resolver = SynonymResolver::new(graph.clone(), vec![local, shared]);

        assert!(resolver.resolve("glad").await.unwrap().is_none());

        graph.add_link("glad", "happy");
        let glad = resolver.resolve("glad").await.unwrap().unwrap();
        assert_eq!(glad.provenance, Provenance::Computed);
        assert_eq!(
            sorted(glad.synonyms),
            vec!["cheerful", "happy", "joyful", "optimistic"]
        );
    }

    #[tokio::test]
    async fn test_local_eviction_forces_recompute() {
        let graph = Arc::new(InMemoryGraph::from_pairs([("a", "x"), ("b", "y"), ("c", "z")]));
        let local = local_tier(2);
        let resolver = SynonymResolver::new(graph, vec![local]);

        resolver.resolve("a").await.unwrap();
        resolver.resolve("b").await.unwrap();
        resolver.resolve("c").await.unwrap();

        let a = resolver.resolve("a").await.unwrap().unwrap();
        assert_eq!(a.provenance, Provenance::Computed);
        let c = resolver.resolve("c").await.unwrap().unwrap();
        assert_eq!(c.provenance, Provenance::HitLocal);
    }

    #[tokio::test]
    async fn test_evicted_word_served_by_distributed_tier() {
        let graph = Arc::new(InMemoryGraph::from_pairs([("a", "x"), ("b", "y"), ("c", "z")]));
        let local = local_tier(2);
        let shared = shared_tier(Arc::new(InMemorySharedBackend::new()));
        let resolver = SynonymResolver::new(graph, vec![local, shared]);

        for word in ["a", "b", "c"] {
            resolver.resolve(word).await.unwrap();
        }

        let a = resolver.resolve("a").await.unwrap().unwrap();
        assert_eq!(a.provenance, Provenance::HitDistributed);
        assert_eq!(a.synonyms, vec!["x".to_string()]);
    }

    #[tokio::test]
    async fn test_unavailable_distributed_tier_degrades_to_graph() {
        let local = local_tier(10);
        let resolver =
            SynonymResolver::new(happy_graph(), vec![local, unavailable_tier()]);

        let first = resolver.resolve("happy").await.unwrap().unwrap();
        assert_eq!(first.provenance, Provenance::Computed);
        assert_eq!(sorted(first.synonyms), vec!["cheerful", "joyful", "optimistic"]);

        // The local tier was still written.
        let second = resolver.resolve("happy").await.unwrap().unwrap();
        assert_eq!(second.provenance, Provenance::HitLocal);
    }

    /// Substrate whose reads never return; signals each read it swallows.
    struct StalledBackend {
        entered: tokio::sync::Notify,
    }

    #[async_trait]
    impl SharedCacheBackend for StalledBackend {
        fn name(&self) -> &'static str {
            "stalled"
        }

        async fn fetch(&self, _key: &str) -> ThesaurusResult<Option<Vec<u8>>> {
            self.entered.notify_one();
            std::future::pending().await
        }

        async fn store(&self, _key: &str, _value: Vec<u8>, _ttl: Duration) -> ThesaurusResult<()> {
            std::future::pending().await
        }

        async fn remove(&self, _key: &str) -> ThesaurusResult<bool> {
            Ok(false)
        }
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_local_hits_flow_while_distributed_call_is_stalled() {
        let backend = Arc::new(StalledBackend {
            entered: tokio::sync::Notify::new(),
        });
        let local = local_tier(10);
        let shared: Arc<dyn CacheTier> = Arc::new(DistributedTier::new(
            backend.clone(),
            Duration::from_secs(60),
            Duration::from_secs(60),
        ));
        local
            .put(CacheEntry::computed(
                &WordKey::normalize("happy"),
                vec!["joyful".to_string()],
            ))
            .await
            .unwrap();
        let resolver = Arc::new(SynonymResolver::new(happy_graph(), vec![local, shared]));

        // Misses the local tier and parks inside the distributed read.
        let stalled = tokio::spawn({
            let resolver = resolver.clone();
            async move { resolver.resolve("cheerful").await }
        });
        backend.entered.notified().await;

        let hits = tokio::time::timeout(Duration::from_secs(5), async {
            for _ in 0..100 {
                let hit = resolver.resolve("happy").await.unwrap().unwrap();
                assert_eq!(hit.provenance, Provenance::HitLocal);
            }
        })
        .await;
        assert!(hits.is_ok(), "local hits blocked behind a stalled distributed read");
        assert!(!stalled.is_finished());

        stalled.abort();
    }

    #[tokio::test]
    async fn test_storage_error_propagates() {
        let resolver = SynonymResolver::uncached(Arc::new(DownGraph));
        let err = resolver.resolve("happy").await.unwrap_err();
        assert!(matches!(
            err,
            ThesaurusError::Storage(StorageError::Unavailable { .. })
        ));
    }

    #[tokio::test]
    async fn test_invalidate_counts_acknowledging_tiers() {
        let local = local_tier(10);
        let shared = shared_tier(Arc::new(InMemorySharedBackend::new()));
        let resolver = SynonymResolver::new(happy_graph(), vec![local, shared]);

        resolver.resolve("happy").await.unwrap();
        assert_eq!(resolver.invalidate(" Happy").await, 2);

        let again = resolver.resolve("happy").await.unwrap().unwrap();
        assert_eq!(again.provenance, Provenance::Computed);

        let broken = SynonymResolver::new(happy_graph(), vec![unavailable_tier()]);
        assert_eq!(broken.invalidate("happy").await, 0);
        assert_eq!(broken.invalidate("  ").await, 0);
    }

    #[tokio::test]
    async fn test_stats_reported_in_lookup_order() {
        let local = local_tier(10);
        let shared = shared_tier(Arc::new(InMemorySharedBackend::new()));
        let resolver = SynonymResolver::new(happy_graph(), vec![local, shared]);

        resolver.resolve("happy").await.unwrap();
        resolver.resolve("happy").await.unwrap();

        let stats = resolver.stats();
        assert_eq!(stats.len(), 2);
        assert_eq!(stats[0].0, TierKind::Local);
        assert_eq!(stats[0].1.hits, 1);
        assert_eq!(stats[0].1.misses, 1);
        assert_eq!(stats[0].1.entry_count, 1);
        assert_eq!(stats[1].0, TierKind::Distributed);
        assert_eq!(stats[1].1.misses, 1);
    }

    #[tokio::test]
    async fn test_from_config_builds_enabled_tiers() {
        let config = ResolverConfig::new()
            .with_local_capacity(4)
            .with_backend(DistributedBackend::Memory);
        let resolver = SynonymResolver::from_config(happy_graph(), &config).unwrap();
        let kinds: Vec<TierKind> = resolver.tiers().iter().map(|t| t.kind()).collect();
        assert_eq!(kinds, vec![TierKind::Local, TierKind::Distributed]);

        let resolver = SynonymResolver::from_config(
            happy_graph(),
            &ResolverConfig::new().with_distributed_enabled(false),
        )
        .unwrap();
        let kinds: Vec<TierKind> = resolver.tiers().iter().map(|t| t.kind()).collect();
        assert_eq!(kinds, vec![TierKind::Local]);

        let resolver =
            SynonymResolver::from_config(happy_graph(), &ResolverConfig::uncached()).unwrap();
        assert!(resolver.tiers().is_empty());
    }

    #[tokio::test]
    async fn test_from_config_with_lmdb_backend() {
        let dir = tempfile::TempDir::new().unwrap();
        let config = ResolverConfig::new()
            .with_local_enabled(false)
            .with_backend(DistributedBackend::Lmdb {
                path: dir.path().to_path_buf(),
                max_size_mb: 10,
            });
        let resolver = SynonymResolver::from_config(happy_graph(), &config).unwrap();

        resolver.resolve("happy").await.unwrap();
        let hit = resolver.resolve("happy").await.unwrap().unwrap();
        assert_eq!(hit.provenance, Provenance::HitDistributed);
    }

    #[test]
    fn test_from_config_rejects_zero_capacity() {
        let config = ResolverConfig::new()
            .with_local_capacity(0)
            .with_backend(DistributedBackend::Memory);
        let err = SynonymResolver::from_config(happy_graph(), &config).err().unwrap();
        assert!(matches!(err, ThesaurusError::Config(_)));
    }
}
