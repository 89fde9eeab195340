//! Infrastructure layer wiring concrete adapters (embeddings, storage, LLM, rendering).

pub mod embeddings;
pub mod llm;
pub mod render;
pub mod storage;

pub use embeddings::CachedEmbeddingEngine;
#[cfg(feature = "fastembed-engine")]
pub use embeddings::FastEmbedEngine;
pub use embeddings::SimpleEmbedEngine;
pub use llm::OllamaIdeaGenerator;
pub use render::SvgPlaceholderRenderer;
pub use storage::{SledCatalogStore, UploadDirectory};
