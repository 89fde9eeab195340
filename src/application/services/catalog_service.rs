use std::path::Path;
use std::sync::Arc;

use tracing::{info, warn};

use crate::{
    application::{
        dtos::HealthStatusResponse,
        services::ranker::{SimilarityRanker, DEFAULT_TOP_K},
    },
    domain::{
        models::{MAX_DESCRIPTION_CHARS, MAX_NAME_CHARS},
        CatalogEntry, DomainError, NewTattoo, RankedResult, TattooDraft, TattooRecord,
    },
};

/// High level configuration shared by the service and its adapters.
#[derive(Debug, Clone)]
pub struct ServiceConfig {
    pub top_k: usize,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            top_k: DEFAULT_TOP_K,
        }
    }
}

impl ServiceConfig {
    pub fn new(top_k: usize) -> Self {
        Self {
            top_k: top_k.max(1),
        }
    }
}

/// Contract for the persistent catalog of tattoo records.
pub trait CatalogStore: Send + Sync {
    fn insert(&self, draft: TattooDraft) -> Result<TattooRecord, DomainError>;

    fn get(&self, id: u64) -> Result<Option<TattooRecord>, DomainError>;

    /// All records in insertion order.
    fn list(&self) -> Result<Vec<TattooRecord>, DomainError>;

    fn count(&self) -> Result<usize, DomainError>;

    fn ping(&self) -> Result<(), DomainError>;
}

/// Contract for wherever uploaded image bytes end up.
pub trait ImageStore: Send + Sync {
    /// Writes `bytes` under a sanitised version of `file_name` and returns
    /// the stored name.
    fn save(&self, file_name: &str, bytes: &[u8]) -> Result<String, DomainError>;

    fn root(&self) -> &Path;
}

/// The orchestrator for catalog uploads, listings and recommendations.
pub struct CatalogService {
    store: Arc<dyn CatalogStore>,
    images: Arc<dyn ImageStore>,
    ranker: SimilarityRanker,
    config: ServiceConfig,
}

impl CatalogService {
    pub fn new(
        store: Arc<dyn CatalogStore>,
        images: Arc<dyn ImageStore>,
        ranker: SimilarityRanker,
        config: ServiceConfig,
    ) -> Self {
        Self {
            store,
            images,
            ranker,
            config,
        }
    }

    pub fn upload(&self, payload: NewTattoo) -> Result<TattooRecord, DomainError> {
        Self::validate_upload(&payload)?;

        let stored_name = self.images.save(&payload.file_name, &payload.bytes)?;
        let record = self.store.insert(TattooDraft {
            name: payload.name,
            description: payload.description,
            image: stored_name,
        })?;

        info!(id = record.id, image = %record.image, "tattoo uploaded");
        Ok(record)
    }

    pub fn list(&self) -> Result<Vec<TattooRecord>, DomainError> {
        self.store.list()
    }

    pub fn get(&self, id: u64) -> Result<TattooRecord, DomainError> {
        self.store
            .get(id)?
            .ok_or_else(|| DomainError::not_found(format!("tattoo {id}")))
    }

    /// Recommends using the configured `top_k`.
    pub fn recommend(&self, user_input: &str) -> Result<Vec<RankedResult>, DomainError> {
        self.recommend_top(user_input, self.config.top_k)
    }

    pub fn recommend_top(
        &self,
        user_input: &str,
        top_k: usize,
    ) -> Result<Vec<RankedResult>, DomainError> {
        let corpus: Vec<CatalogEntry> = self
            .store
            .list()?
            .into_iter()
            .map(CatalogEntry::from)
            .collect();

        if corpus.is_empty() {
            warn!("recommendation requested against an empty catalog");
        }

        self.ranker.rank(user_input, &corpus, top_k)
    }

    pub fn model_name(&self) -> &str {
        self.ranker.embedder().model_name()
    }

    pub fn uploads_root(&self) -> &Path {
        self.images.root()
    }

    pub fn health(&self) -> Result<HealthStatusResponse, DomainError> {
        self.store.ping()?;

        Ok(HealthStatusResponse {
            status: "healthy".into(),
            service: "inkmatch".into(),
            model: self.model_name().to_string(),
            tattoos: self.store.count()?,
        })
    }

    fn validate_upload(payload: &NewTattoo) -> Result<(), DomainError> {
        if payload.name.trim().is_empty() {
            return Err(DomainError::validation("name is required"));
        }
        if payload.name.chars().count() > MAX_NAME_CHARS {
            return Err(DomainError::limit(format!(
                "name cannot exceed {} characters",
                MAX_NAME_CHARS
            )));
        }
        if payload.description.trim().is_empty() {
            return Err(DomainError::validation("description is required"));
        }
        if payload.description.chars().count() > MAX_DESCRIPTION_CHARS {
            return Err(DomainError::limit(format!(
                "description cannot exceed {} characters",
                MAX_DESCRIPTION_CHARS
            )));
        }
        if payload.file_name.trim().is_empty() {
            return Err(DomainError::validation("file name is required"));
        }
        if payload.bytes.is_empty() {
            return Err(DomainError::validation("file is empty"));
        }
        Ok(())
    }
}
