use ahash::RandomState;

use crate::{application::services::EmbeddingEngine, domain::DomainError};

pub const DEFAULT_SIMPLE_MODEL: &str = "inkmatch/simple-hash";
pub const DEFAULT_SIMPLE_DIMENSIONS: usize = 256;

/// Token hashing keys. Changing them moves every token to a new bucket.
const HASH_SEEDS: [u64; 4] = [
    0x243f_6a88_85a3_08d3,
    0x1319_8a2e_0370_7344,
    0xa409_3822_299f_31d0,
    0x082e_fa98_ec4e_6c89,
];

fn token_hasher() -> RandomState {
    let [k0, k1, k2, k3] = HASH_SEEDS;
    RandomState::with_seeds(k0, k1, k2, k3)
}

/// A lightweight, deterministic embedding engine that hashes tokens into a fixed-size vector.
/// This is not meant for production-grade semantic search, but it keeps the service functional
/// without downloading external models or shipping native dependencies.
pub struct SimpleEmbedEngine {
    model_name: String,
    dimensions: usize,
    hasher: RandomState,
}

impl SimpleEmbedEngine {
    pub fn try_new(model_name: impl Into<String>, dimensions: usize) -> Result<Self, DomainError> {
        if dimensions == 0 {
            return Err(DomainError::validation(
                "embedding dimensions must be greater than zero",
            ));
        }
        Ok(Self {
            model_name: model_name.into(),
            dimensions: dimensions.clamp(8, 4096),
            hasher: token_hasher(),
        })
    }

    fn tokenize(text: &str) -> impl Iterator<Item = String> + '_ {
        text.split(|c: char| c.is_whitespace() || c.is_ascii_punctuation())
            .filter(|token| !token.is_empty())
            .map(str::to_lowercase)
    }

    fn bucket(&self, token: &str) -> usize {
        (self.hasher.hash_one(token) % self.dimensions as u64) as usize
    }

    fn embed_internal(&self, text: &str) -> Vec<f32> {
        let mut vector = vec![0.0f32; self.dimensions];

        for token in Self::tokenize(text) {
            vector[self.bucket(&token)] += 1.0;
        }

        // L2 normalize to keep scores in [-1, 1]; token-less text stays zero.
        let norm = vector.iter().map(|v| v * v).sum::<f32>().sqrt();
        if norm > 0.0 {
            for value in &mut vector {
                *value /= norm;
            }
        }

        vector
    }
}

impl Default for SimpleEmbedEngine {
    fn default() -> Self {
        Self {
            model_name: DEFAULT_SIMPLE_MODEL.to_string(),
            dimensions: DEFAULT_SIMPLE_DIMENSIONS,
            hasher: token_hasher(),
        }
    }
}

impl EmbeddingEngine for SimpleEmbedEngine {
    fn embed(&self, text: &str) -> Result<Vec<f32>, DomainError> {
        Ok(self.embed_internal(text))
    }

    fn dims(&self) -> Option<usize> {
        Some(self.dimensions)
    }

    fn model_name(&self) -> &str {
        &self.model_name
    }
}
