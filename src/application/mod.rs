//! Application layer wiring DTOs and services for inkmatch.

pub mod dtos;
pub mod services;

pub use dtos::{
    HealthStatusResponse, IdeaResponse, ImageDataResponse, ImagePromptResponse, PromptRequest,
    RecommendRequest, RecommendationDto, TattooDto,
};
pub use services::{CatalogService, SimilarityRanker, StudioService};
