use std::str::FromStr;

use fastembed::{EmbeddingModel, TextEmbedding, TextInitOptions};
use parking_lot::Mutex;
use tracing::info;

use crate::{application::services::EmbeddingEngine, domain::DomainError};

pub const DEFAULT_FASTEMBED_MODEL: &str = "sentence-transformers/all-MiniLM-L6-v2";

/// Embedding engine backed by `fastembed`'s `TextEmbedding`.
///
/// The model is loaded once and kept behind a `Mutex` that only guards the
/// inference call; blank input short-circuits to the zero vector.
pub struct FastEmbedEngine {
    model_label: String,
    dimensions: usize,
    inner: Mutex<TextEmbedding>,
}

impl FastEmbedEngine {
    /// Create a new engine for the given model (for example `sentence-transformers/all-MiniLM-L6-v2`).
    pub fn try_new(model_name: impl AsRef<str>) -> Result<Self, DomainError> {
        let label = model_name.as_ref().trim();
        if label.is_empty() {
            return Err(DomainError::validation(
                "fastembed model name cannot be empty",
            ));
        }

        let embedding_model = parse_model(label)?;

        let model_info = TextEmbedding::get_model_info(&embedding_model).map_err(|err| {
            DomainError::embedding(format!(
                "unable to read metadata for fastembed model `{label}`: {err}"
            ))
        })?;

        let init_options = TextInitOptions::new(embedding_model.clone());
        let text_embedding = TextEmbedding::try_new(init_options).map_err(|err| {
            DomainError::embedding(format!(
                "failed to initialise fastembed model `{label}`: {err}"
            ))
        })?;

        info!(model = label, dims = model_info.dim, "fastembed model loaded");

        Ok(Self {
            model_label: label.to_string(),
            dimensions: model_info.dim,
            inner: Mutex::new(text_embedding),
        })
    }

    fn check_dims(&self, vector: &[f32]) -> Result<(), DomainError> {
        if vector.len() != self.dimensions {
            return Err(DomainError::embedding(format!(
                "unexpected embedding dimension (expected {}, got {})",
                self.dimensions,
                vector.len()
            )));
        }
        Ok(())
    }
}

fn parse_model(label: &str) -> Result<EmbeddingModel, DomainError> {
    match label {
        "all-MiniLM-L6-v2" | "sentence-transformers/all-MiniLM-L6-v2" => {
            Ok(EmbeddingModel::AllMiniLML6V2)
        }
        other => EmbeddingModel::from_str(other).map_err(|err| {
            DomainError::embedding(format!("failed to parse fastembed model `{other}`: {err}"))
        }),
    }
}

impl EmbeddingEngine for FastEmbedEngine {
    fn embed(&self, text: &str) -> Result<Vec<f32>, DomainError> {
        self.embed_batch(&[text])?
            .into_iter()
            .next()
            .ok_or_else(|| DomainError::embedding("fastembed returned no embedding"))
    }

    fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>, DomainError> {
        let pending: Vec<&str> = texts
            .iter()
            .copied()
            .filter(|text| !text.trim().is_empty())
            .collect();

        let computed: Vec<Vec<f32>> = if pending.is_empty() {
            Vec::new()
        } else {
            let mut embedder = self.inner.lock();
            embedder.embed(pending, None).map_err(|err| {
                DomainError::embedding(format!("fastembed inference failed: {err}"))
            })?
        };
        let mut computed = computed.into_iter();

        let mut vectors = Vec::with_capacity(texts.len());
        for text in texts {
            if text.trim().is_empty() {
                vectors.push(vec![0.0; self.dimensions]);
                continue;
            }
            let vector = computed
                .next()
                .ok_or_else(|| DomainError::embedding("fastembed returned too few embeddings"))?;
            self.check_dims(&vector)?;
            vectors.push(vector);
        }

        Ok(vectors)
    }

    fn dims(&self) -> Option<usize> {
        Some(self.dimensions)
    }

    fn model_name(&self) -> &str {
        &self.model_label
    }
}
