use std::cmp::Ordering;
use std::sync::Arc;

use tracing::debug;

use crate::domain::{CatalogEntry, DomainError, EmbeddingVector, RankedResult};

/// Number of recommendations returned when the caller does not ask otherwise.
pub const DEFAULT_TOP_K: usize = 3;

/// Abstraction over any text embedding backend (hash, FastEmbed, cached, ...).
///
/// Implementations must map blank or token-less input to the zero vector
/// instead of failing, so every query string can be ranked.
pub trait EmbeddingEngine: Send + Sync {
    fn embed(&self, text: &str) -> Result<Vec<f32>, DomainError>;

    fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>, DomainError> {
        texts.iter().map(|text| self.embed(text)).collect()
    }

    fn dims(&self) -> Option<usize> {
        None
    }

    fn model_name(&self) -> &str;
}

/// Ranks catalog entries against a free-text query by cosine similarity.
pub struct SimilarityRanker {
    embedder: Arc<dyn EmbeddingEngine>,
}

impl SimilarityRanker {
    pub fn new(embedder: Arc<dyn EmbeddingEngine>) -> Self {
        Self { embedder }
    }

    pub fn embedder(&self) -> &Arc<dyn EmbeddingEngine> {
        &self.embedder
    }

    /// Returns at most `top_k` entries ordered by descending similarity.
    ///
    /// Equal scores keep their corpus order. An empty corpus (or `top_k == 0`)
    /// yields an empty result without touching the embedding engine.
    pub fn rank(
        &self,
        query: &str,
        corpus: &[CatalogEntry],
        top_k: usize,
    ) -> Result<Vec<RankedResult>, DomainError> {
        if corpus.is_empty() || top_k == 0 {
            return Ok(Vec::new());
        }

        let descriptions: Vec<&str> = corpus.iter().map(|e| e.description.as_str()).collect();
        let corpus_vectors = self
            .embedder
            .embed_batch(&descriptions)
            .map_err(as_unavailable)?;

        if corpus_vectors.len() != corpus.len() {
            return Err(DomainError::embedding(format!(
                "engine returned {} vectors for {} descriptions",
                corpus_vectors.len(),
                corpus.len()
            )));
        }

        let query_vector = EmbeddingVector::new(self.embedder.embed(query).map_err(as_unavailable)?);

        let mut scored: Vec<(usize, f32)> = Vec::with_capacity(corpus.len());
        for (idx, values) in corpus_vectors.into_iter().enumerate() {
            let candidate = EmbeddingVector::new(values);
            let score = query_vector.cosine(&candidate).ok_or_else(|| {
                DomainError::embedding(format!(
                    "embedding dimension mismatch: query {} vs entry {}",
                    query_vector.dims(),
                    candidate.dims()
                ))
            })?;
            scored.push((idx, score));
        }

        // `sort_by` is stable, so ties keep corpus order.
        scored.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(Ordering::Equal));
        scored.truncate(top_k);

        debug!(
            model = self.embedder.model_name(),
            corpus = corpus.len(),
            returned = scored.len(),
            "ranked catalog entries"
        );

        Ok(scored
            .into_iter()
            .map(|(idx, score)| RankedResult::from_entry(&corpus[idx], score))
            .collect())
    }
}

fn as_unavailable(err: DomainError) -> DomainError {
    match err {
        DomainError::EmbeddingUnavailable(_) => err,
        other => DomainError::embedding(other.to_string()),
    }
}
