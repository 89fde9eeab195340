use serde::{Deserialize, Serialize};

use crate::domain::{RankedResult, TattooRecord};

/// Body shared by the recommendation and generative endpoints.
///
/// A missing `user_input` is treated as an empty string.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PromptRequest {
    #[serde(default)]
    pub user_input: String,
}

/// Recommendation body; `top_k` falls back to the configured default.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RecommendRequest {
    #[serde(default)]
    pub user_input: String,
    #[serde(default)]
    pub top_k: Option<usize>,
}

/// Catalog row as returned to the frontend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TattooDto {
    pub id: u64,
    pub name: String,
    pub description: String,
    pub image: String,
}

impl From<TattooRecord> for TattooDto {
    fn from(record: TattooRecord) -> Self {
        Self {
            id: record.id,
            name: record.name,
            description: record.description,
            image: record.image,
        }
    }
}

/// One recommendation on the wire; the similarity score stays internal.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecommendationDto {
    pub name: String,
    pub description: String,
    pub image: String,
}

impl From<RankedResult> for RecommendationDto {
    fn from(result: RankedResult) -> Self {
        Self {
            name: result.name,
            description: result.description,
            image: result.image,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IdeaResponse {
    pub idea: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImagePromptResponse {
    pub message: String,
    pub prompt: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImageDataResponse {
    pub image: String,
}

/// Health/readiness report for diagnostics.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthStatusResponse {
    pub status: String,
    pub service: String,
    pub model: String,
    pub tattoos: usize,
}
