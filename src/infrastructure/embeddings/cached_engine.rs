//! Content-addressed cache in front of another embedding engine.
//!
//! Corpus descriptions are re-embedded on every recommendation; with a slow
//! model this decorator lets repeated descriptions skip inference. Entries are
//! keyed by the exact text, so cached and uncached rankings are identical.

use std::collections::VecDeque;
use std::sync::Arc;

use ahash::AHashMap;
use parking_lot::Mutex;

use crate::{application::services::EmbeddingEngine, domain::DomainError};

struct CacheState {
    vectors: AHashMap<String, Vec<f32>>,
    order: VecDeque<String>,
}

pub struct CachedEmbeddingEngine {
    inner: Arc<dyn EmbeddingEngine>,
    capacity: usize,
    state: Mutex<CacheState>,
}

impl CachedEmbeddingEngine {
    pub fn new(inner: Arc<dyn EmbeddingEngine>, capacity: usize) -> Self {
        Self {
            inner,
            capacity: capacity.max(1),
            state: Mutex::new(CacheState {
                vectors: AHashMap::new(),
                order: VecDeque::new(),
            }),
        }
    }

    pub fn len(&self) -> usize {
        self.state.lock().vectors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn lookup(&self, text: &str) -> Option<Vec<f32>> {
        self.state.lock().vectors.get(text).cloned()
    }

    fn remember(&self, text: &str, vector: &[f32]) {
        let mut state = self.state.lock();
        if state.vectors.contains_key(text) {
            return;
        }
        // FIFO eviction
        while state.vectors.len() >= self.capacity {
            match state.order.pop_front() {
                Some(oldest) => {
                    state.vectors.remove(&oldest);
                }
                None => break,
            }
        }
        state.vectors.insert(text.to_string(), vector.to_vec());
        state.order.push_back(text.to_string());
    }
}

impl EmbeddingEngine for CachedEmbeddingEngine {
    fn embed(&self, text: &str) -> Result<Vec<f32>, DomainError> {
        if let Some(hit) = self.lookup(text) {
            return Ok(hit);
        }
        let vector = self.inner.embed(text)?;
        self.remember(text, &vector);
        Ok(vector)
    }

    fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>, DomainError> {
        let mut vectors: Vec<Option<Vec<f32>>> = texts.iter().map(|t| self.lookup(t)).collect();

        let misses: Vec<&str> = texts
            .iter()
            .zip(vectors.iter())
            .filter(|(_, hit)| hit.is_none())
            .map(|(text, _)| *text)
            .collect();

        if !misses.is_empty() {
            let computed = self.inner.embed_batch(&misses)?;
            if computed.len() != misses.len() {
                return Err(DomainError::embedding(format!(
                    "engine returned {} vectors for {} texts",
                    computed.len(),
                    misses.len()
                )));
            }

            let mut computed = computed.into_iter();
            for (text, slot) in texts.iter().zip(vectors.iter_mut()) {
                if slot.is_none() {
                    if let Some(vector) = computed.next() {
                        self.remember(text, &vector);
                        *slot = Some(vector);
                    }
                }
            }
        }

        vectors
            .into_iter()
            .map(|slot| slot.ok_or_else(|| DomainError::embedding("missing embedding in batch")))
            .collect()
    }

    fn dims(&self) -> Option<usize> {
        self.inner.dims()
    }

    fn model_name(&self) -> &str {
        self.inner.model_name()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;
    use crate::application::services::SimilarityRanker;
    use crate::domain::CatalogEntry;
    use crate::infrastructure::embeddings::SimpleEmbedEngine;

    struct Counting {
        inner: SimpleEmbedEngine,
        calls: AtomicUsize,
    }

    impl EmbeddingEngine for Counting {
        fn embed(&self, text: &str) -> Result<Vec<f32>, DomainError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.inner.embed(text)
        }

        fn model_name(&self) -> &str {
            self.inner.model_name()
        }
    }

    fn counting() -> Arc<Counting> {
        Arc::new(Counting {
            inner: SimpleEmbedEngine::default(),
            calls: AtomicUsize::new(0),
        })
    }

    #[test]
    fn repeated_text_hits_the_cache() {
        let inner = counting();
        let cached = CachedEmbeddingEngine::new(inner.clone(), 16);

        let first = cached.embed("black panther").unwrap();
        let second = cached.embed("black panther").unwrap();

        assert_eq!(first, second);
        assert_eq!(inner.calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn batch_only_embeds_misses() {
        let inner = counting();
        let cached = CachedEmbeddingEngine::new(inner.clone(), 16);
        cached.embed("anchor").unwrap();

        let vectors = cached
            .embed_batch(&["anchor", "swallow", "anchor", "heart"])
            .unwrap();

        assert_eq!(vectors.len(), 4);
        assert_eq!(vectors[0], vectors[2]);
        // "anchor" up front, then only "swallow" and "heart"
        assert_eq!(inner.calls.load(Ordering::SeqCst), 3);
    }

    #[test]
    fn capacity_evicts_oldest_first() {
        let inner = counting();
        let cached = CachedEmbeddingEngine::new(inner.clone(), 2);
        cached.embed("one").unwrap();
        cached.embed("two").unwrap();
        cached.embed("three").unwrap();
        assert_eq!(cached.len(), 2);

        cached.embed("one").unwrap();
        assert_eq!(inner.calls.load(Ordering::SeqCst), 4);
    }

    #[test]
    fn cached_ranking_matches_uncached() {
        let corpus = vec![
            CatalogEntry::new("A", "dragon on a mountain", "a.png"),
            CatalogEntry::new("B", "rose with thorns", "b.png"),
            CatalogEntry::new("C", "dragon flying over mountains", "c.png"),
            CatalogEntry::new("D", "rose with thorns", "d.png"),
        ];
        let plain = SimilarityRanker::new(Arc::new(SimpleEmbedEngine::default()));
        let cached = SimilarityRanker::new(Arc::new(CachedEmbeddingEngine::new(
            Arc::new(SimpleEmbedEngine::default()),
            8,
        )));

        for query in ["a fierce dragon", "thorny rose", ""] {
            let expected = plain.rank(query, &corpus, 3).unwrap();
            assert_eq!(cached.rank(query, &corpus, 3).unwrap(), expected);
            assert_eq!(cached.rank(query, &corpus, 3).unwrap(), expected);
        }
    }
}
