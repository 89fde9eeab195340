use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Upper bound on tattoo names accepted at upload time.
pub const MAX_NAME_CHARS: usize = 200;

/// Upper bound on descriptions; they are embedded on every recommendation.
pub const MAX_DESCRIPTION_CHARS: usize = 4_000;

/// Persisted catalog row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TattooRecord {
    pub id: u64,
    pub name: String,
    pub description: String,
    /// Stored file name inside the uploads directory.
    pub image: String,
    pub created_at: DateTime<Utc>,
}

impl TattooRecord {
    pub fn new(id: u64, draft: TattooDraft) -> Self {
        Self {
            id,
            name: draft.name,
            description: draft.description,
            image: draft.image,
            created_at: Utc::now(),
        }
    }
}

impl From<TattooRecord> for CatalogEntry {
    fn from(record: TattooRecord) -> Self {
        Self {
            name: record.name,
            description: record.description,
            image: record.image,
        }
    }
}

/// Validated row handed to the catalog store; the store assigns the id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TattooDraft {
    pub name: String,
    pub description: String,
    pub image: String,
}

/// Upload payload as received from the web boundary.
#[derive(Debug, Clone)]
pub struct NewTattoo {
    pub name: String,
    pub description: String,
    pub file_name: String,
    pub bytes: Vec<u8>,
}

/// Read-only ranking input.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogEntry {
    pub name: String,
    pub description: String,
    pub image: String,
}

impl CatalogEntry {
    pub fn new(
        name: impl Into<String>,
        description: impl Into<String>,
        image: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            image: image.into(),
        }
    }
}

/// Ranking output: a verbatim projection of a `CatalogEntry` plus its score.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankedResult {
    pub name: String,
    pub description: String,
    pub image: String,
    pub score: f32,
}

impl RankedResult {
    pub fn from_entry(entry: &CatalogEntry, score: f32) -> Self {
        Self {
            name: entry.name.clone(),
            description: entry.description.clone(),
            image: entry.image.clone(),
            score,
        }
    }
}

/// Vector representation of a piece of text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmbeddingVector {
    pub values: Vec<f32>,
}

impl EmbeddingVector {
    pub fn new(values: Vec<f32>) -> Self {
        Self { values }
    }

    pub fn dims(&self) -> usize {
        self.values.len()
    }

    pub fn magnitude(&self) -> f32 {
        self.values.iter().map(|v| v * v).sum::<f32>().sqrt()
    }

    /// Cosine similarity, `0` when either side has zero magnitude.
    ///
    /// Returns `None` when the dimensions disagree.
    pub fn cosine(&self, other: &EmbeddingVector) -> Option<f32> {
        if self.dims() != other.dims() {
            return None;
        }

        let mut dot = 0.0f32;
        let mut a_norm = 0.0f32;
        let mut b_norm = 0.0f32;

        for (a, b) in self.values.iter().zip(other.values.iter()) {
            dot += a * b;
            a_norm += a * a;
            b_norm += b * b;
        }

        let denom = a_norm.sqrt() * b_norm.sqrt();
        if denom == 0.0 {
            return Some(0.0);
        }

        let score = dot / denom;
        if !score.is_finite() {
            return Some(0.0);
        }
        Some(score.clamp(-1.0, 1.0))
    }
}
