//! In-memory synonym graph.
//!
//! Links are folded into an undirected adjacency map at insert time, so
//! `neighbors` never has to reason about storage direction.

use std::collections::{HashMap, HashSet};
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use async_trait::async_trait;
use thesaurus_core::{SynonymLink, ThesaurusResult, Word, WordId, WordKey};

use super::GraphStore;

#[derive(Debug, Default)]
struct GraphInner {
    words: HashMap<WordId, Word>,
    by_text: HashMap<String, WordId>,
    adjacency: HashMap<WordId, HashSet<WordId>>,
    next_id: i64,
}

impl GraphInner {
    fn word_or_insert(&mut self, key: WordKey) -> Word {
        if let Some(id) = self.by_text.get(key.as_str()) {
            return self.words[id].clone();
        }
        self.next_id += 1;
        let word = Word::new(WordId::new(self.next_id), key.into_string());
        self.by_text.insert(word.text.clone(), word.id);
        self.words.insert(word.id, word.clone());
        self.adjacency.entry(word.id).or_default();
        word
    }

    fn link(&mut self, link: SynonymLink) {
        if link.is_self_loop() {
            return;
        }
        self.adjacency
            .entry(link.word_id)
            .or_default()
            .insert(link.synonym_id);
        self.adjacency
            .entry(link.synonym_id)
            .or_default()
            .insert(link.word_id);
    }
}

/// Graph held entirely in process memory.
///
/// Used by tests and single-node development setups. The mutation helpers
/// exist for seeding; the resolver only ever reads.
#[derive(Debug, Default)]
pub struct InMemoryGraph {
    inner: RwLock<GraphInner>,
}

impl InMemoryGraph {
    /// Create an empty graph.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a graph from `(word, synonym)` pairs.
    pub fn from_pairs<I, A, B>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (A, B)>,
        A: AsRef<str>,
        B: AsRef<str>,
    {
        let graph = Self::new();
        for (a, b) in pairs {
            graph.add_link(a.as_ref(), b.as_ref());
        }
        graph
    }

    fn read(&self) -> RwLockReadGuard<'_, GraphInner> {
        self.inner.read().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn write(&self) -> RwLockWriteGuard<'_, GraphInner> {
        self.inner.write().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Insert a word (normalized) or return the existing node.
    pub fn add_word(&self, text: &str) -> Word {
        self.write().word_or_insert(WordKey::normalize(text))
    }

    /// Link two words, creating either node if needed.
    pub fn add_link(&self, word: &str, synonym: &str) -> SynonymLink {
        let mut inner = self.write();
        let a = inner.word_or_insert(WordKey::normalize(word));
        let b = inner.word_or_insert(WordKey::normalize(synonym));
        let link = SynonymLink::new(a.id, b.id);
        inner.link(link);
        link
    }

    /// Record a raw stored link between existing ids. Unknown ids are ignored.
    pub fn insert_link(&self, link: SynonymLink) -> bool {
        let mut inner = self.write();
        if !inner.words.contains_key(&link.word_id) || !inner.words.contains_key(&link.synonym_id)
        {
            return false;
        }
        inner.link(link);
        true
    }

    /// Number of word nodes.
    pub fn word_count(&self) -> usize {
        self.read().words.len()
    }

    /// Number of distinct undirected links, self-loops excluded.
    pub fn link_count(&self) -> usize {
        let inner = self.read();
        inner.adjacency.values().map(HashSet::len).sum::<usize>() / 2
    }
}

#[async_trait]
impl GraphStore for InMemoryGraph {
    async fn lookup_word(&self, key: &WordKey) -> ThesaurusResult<Option<Word>> {
        let inner = self.read();
        Ok(inner
            .by_text
            .get(key.as_str())
            .and_then(|id| inner.words.get(id))
            .cloned())
    }

    async fn neighbors(&self, id: WordId) -> ThesaurusResult<Vec<Word>> {
        let inner = self.read();
        let Some(ids) = inner.adjacency.get(&id) else {
            return Ok(Vec::new());
        };
        Ok(ids
            .iter()
            .filter_map(|neighbor| inner.words.get(neighbor))
            .cloned()
            .collect())
    }
}
