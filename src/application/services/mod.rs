//! Service layer orchestrating domain operations and infrastructure adapters.

mod catalog_service;
mod ranker;
mod studio_service;

pub use catalog_service::{CatalogService, CatalogStore, ImageStore, ServiceConfig};
pub use ranker::{EmbeddingEngine, SimilarityRanker, DEFAULT_TOP_K};
pub use studio_service::{
    idea_prompt, image_prompt, wrap_caption, IdeaGenerator, PlaceholderRenderer, RenderedImage,
    StudioService, CAPTION_LINE_LIMIT, CAPTION_MAX_LINES,
};
