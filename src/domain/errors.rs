use thiserror::Error;

/// Domain-level errors shared across application components.
#[derive(Debug, Error)]
pub enum DomainError {
    /// The incoming payload missed a required field or violated invariants.
    #[error("validation error: {0}")]
    Validation(String),

    /// Input exceeded guard rails such as maximum length or size.
    #[error("limit exceeded: {0}")]
    LimitExceeded(String),

    /// Requested entity was not found locally.
    #[error("not found: {0}")]
    NotFound(String),

    /// Catch-all for storage-related failures we don't want to leak directly.
    #[error("storage failure: {0}")]
    Storage(String),

    /// The embedding model failed to load or failed during inference.
    #[error("embedding unavailable: {0}")]
    EmbeddingUnavailable(String),

    /// A recommendation query had a shape the ranker cannot accept.
    #[error("invalid query: {0}")]
    InvalidQuery(String),

    /// A remote collaborator (LLM endpoint) failed or answered garbage.
    #[error("upstream failure: {0}")]
    Upstream(String),

    /// Any other unexpected failure.
    #[error("unexpected error: {0}")]
    Other(String),
}

impl DomainError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn limit(msg: impl Into<String>) -> Self {
        Self::LimitExceeded(msg.into())
    }

    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }

    pub fn storage(msg: impl Into<String>) -> Self {
        Self::Storage(msg.into())
    }

    pub fn embedding(msg: impl Into<String>) -> Self {
        Self::EmbeddingUnavailable(msg.into())
    }

    pub fn invalid_query(msg: impl Into<String>) -> Self {
        Self::InvalidQuery(msg.into())
    }

    pub fn upstream(msg: impl Into<String>) -> Self {
        Self::Upstream(msg.into())
    }

    pub fn other(msg: impl Into<String>) -> Self {
        Self::Other(msg.into())
    }

    /// Stable machine-readable code surfaced in HTTP error bodies.
    pub fn code(&self) -> &'static str {
        match self {
            Self::Validation(_) => "VALIDATION_FAILED",
            Self::LimitExceeded(_) => "LIMIT_EXCEEDED",
            Self::NotFound(_) => "NOT_FOUND",
            Self::Storage(_) => "STORAGE_FAILED",
            Self::EmbeddingUnavailable(_) => "EMBEDDING_UNAVAILABLE",
            Self::InvalidQuery(_) => "INVALID_QUERY",
            Self::Upstream(_) => "UPSTREAM_FAILED",
            Self::Other(_) => "INTERNAL",
        }
    }
}
