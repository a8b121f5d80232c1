//! Breadth-first cluster traversal.
//!
//! Walks the connected component containing a start word. The visited set
//! is keyed by [`WordId`], so redundant links and cycles of any length are
//! harmless. There is no depth limit; memory grows with the component only.

use std::collections::{HashSet, VecDeque};

use thesaurus_core::{SynonymCluster, ThesaurusResult, Word, WordId, WordKey};

use crate::graph::GraphStore;

/// Look up `key` and collect its cluster.
///
/// Returns `Ok(None)` when the word has no node in the graph, which is
/// distinct from a node with no links (an empty cluster).
pub async fn resolve_cluster<G>(graph: &G, key: &WordKey) -> ThesaurusResult<Option<SynonymCluster>>
where
    G: GraphStore + ?Sized,
{
    match graph.lookup_word(key).await? {
        Some(start) => collect_cluster(graph, &start).await.map(Some),
        None => Ok(None),
    }
}

/// Collect every word reachable from `start`, excluding `start` itself.
pub async fn collect_cluster<G>(graph: &G, start: &Word) -> ThesaurusResult<SynonymCluster>
where
    G: GraphStore + ?Sized,
{
    let mut visited: HashSet<WordId> = HashSet::new();
    let mut frontier: VecDeque<Word> = VecDeque::new();
    let mut members: Vec<String> = Vec::new();

    frontier.push_back(start.clone());

    while let Some(current) = frontier.pop_front() {
        if !visited.insert(current.id) {
            continue;
        }

        for neighbor in graph.neighbors(current.id).await? {
            if !visited.contains(&neighbor.id) {
                frontier.push_back(neighbor);
            }
        }

        members.push(current.text);
    }

    members.retain(|text| text != &start.text);

    tracing::trace!(
        word = %start.text,
        visited = visited.len(),
        members = members.len(),
        "cluster traversal complete"
    );

    Ok(SynonymCluster::new(start.text.clone(), members))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::InMemoryGraph;
    use async_trait::async_trait;
    use proptest::prelude::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use thesaurus_core::{StorageError, ThesaurusError};

    fn sorted(cluster: &SynonymCluster) -> Vec<&str> {
        let mut out: Vec<&str> = cluster.members.iter().map(String::as_str).collect();
        out.sort();
        out
    }

    async fn cluster_of(graph: &InMemoryGraph, word: &str) -> Option<SynonymCluster> {
        resolve_cluster(graph, &WordKey::normalize(word)).await.unwrap()
    }

    #[tokio::test]
    async fn test_star_graph_from_center_and_leaf() {
        let graph = InMemoryGraph::from_pairs([
            ("happy", "cheerful"),
            ("happy", "joyful"),
            ("happy", "optimistic"),
        ]);

        let happy = cluster_of(&graph, "happy").await.unwrap();
        assert_eq!(sorted(&happy), ["cheerful", "joyful", "optimistic"]);

        let cheerful = cluster_of(&graph, "cheerful").await.unwrap();
        assert_eq!(sorted(&cheerful), ["happy", "joyful", "optimistic"]);
    }

    #[tokio::test]
    async fn test_unknown_word_is_none() {
        let graph = InMemoryGraph::from_pairs([("happy", "cheerful")]);
        assert!(cluster_of(&graph, "unknownword").await.is_none());
    }

    #[tokio::test]
    async fn test_isolated_word_is_empty_not_none() {
        let graph = InMemoryGraph::new();
        graph.add_word("lonely");
        let cluster = cluster_of(&graph, "lonely").await.unwrap();
        assert!(cluster.is_empty());
    }

    #[tokio::test]
    async fn test_cycles_terminate_and_dedup() {
        let graph = InMemoryGraph::from_pairs([
            ("a", "b"),
            ("b", "a"),
            ("b", "c"),
            ("c", "d"),
            ("d", "a"),
        ]);
        let cluster = cluster_of(&graph, "a").await.unwrap();
        assert_eq!(sorted(&cluster), ["b", "c", "d"]);
    }

    #[tokio::test]
    async fn test_disconnected_components_do_not_mix() {
        let graph = InMemoryGraph::from_pairs([("big", "large"), ("fast", "quick")]);
        let cluster = cluster_of(&graph, "fast").await.unwrap();
        assert_eq!(sorted(&cluster), ["quick"]);
    }

    #[tokio::test]
    async fn test_long_chain_has_no_depth_limit() {
        let words: Vec<String> = (0..2_000).map(|i| format!("w{}", i)).collect();
        let graph = InMemoryGraph::from_pairs(words.windows(2).map(|w| (w[0].clone(), w[1].clone())));

        let cluster = cluster_of(&graph, "w0").await.unwrap();
        assert_eq!(cluster.len(), 1_999);
        assert!(cluster.contains("w1999"));
    }

    /// Counts neighbor calls so the test can check each node is expanded once.
    struct CountingGraph {
        inner: InMemoryGraph,
        neighbor_calls: AtomicUsize,
    }

    #[async_trait]
    impl GraphStore for CountingGraph {
        async fn lookup_word(&self, key: &WordKey) -> ThesaurusResult<Option<Word>> {
            self.inner.lookup_word(key).await
        }

        async fn neighbors(&self, id: WordId) -> ThesaurusResult<Vec<Word>> {
            self.neighbor_calls.fetch_add(1, Ordering::SeqCst);
            self.inner.neighbors(id).await
        }
    }

    #[tokio::test]
    async fn test_each_node_expanded_once() {
        let graph = CountingGraph {
            inner: InMemoryGraph::from_pairs([("a", "b"), ("b", "c"), ("c", "a"), ("a", "c")]),
            neighbor_calls: AtomicUsize::new(0),
        };
        let cluster = resolve_cluster(&graph, &WordKey::normalize("a"))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(cluster.len(), 2);
        assert_eq!(graph.neighbor_calls.load(Ordering::SeqCst), 3);
    }

    struct BrokenGraph;

    #[async_trait]
    impl GraphStore for BrokenGraph {
        async fn lookup_word(&self, key: &WordKey) -> ThesaurusResult<Option<Word>> {
            Ok(Some(Word::new(WordId::new(1), key.as_str())))
        }

        async fn neighbors(&self, _id: WordId) -> ThesaurusResult<Vec<Word>> {
            Err(StorageError::Unavailable {
                reason: "connection reset".to_string(),
            }
            .into())
        }
    }

    #[tokio::test]
    async fn test_store_failure_mid_traversal_propagates() {
        let err = resolve_cluster(&BrokenGraph, &WordKey::normalize("x"))
            .await
            .unwrap_err();
        assert!(matches!(err, ThesaurusError::Storage(StorageError::Unavailable { .. })));
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(64))]

        /// Clusters of linked words are symmetric and exclude the query word.
        #[test]
        fn prop_cluster_symmetry(edges in prop::collection::vec((0u8..12, 0u8..12), 0..30)) {
            let rt = tokio::runtime::Builder::new_current_thread().build().unwrap();
            let graph = InMemoryGraph::from_pairs(
                edges.iter().map(|(a, b)| (format!("n{}", a), format!("n{}", b))),
            );

            for i in 0u8..12 {
                let word = format!("n{}", i);
                let Some(cluster) = rt.block_on(cluster_of(&graph, &word)) else {
                    continue;
                };
                prop_assert!(!cluster.contains(&word));

                for member in &cluster.members {
                    let back = rt.block_on(cluster_of(&graph, member)).unwrap();
                    prop_assert!(back.contains(&word));
                    prop_assert_eq!(back.len(), cluster.len());
                }
            }
        }
    }
}
