use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{anyhow, Context, Result};
use tracing::{info, warn};

pub mod application;
pub mod domain;
pub mod infrastructure;
pub mod interfaces;
pub mod settings;

use application::services::{EmbeddingEngine, ServiceConfig};
use application::{CatalogService, SimilarityRanker, StudioService};
#[cfg(feature = "fastembed-engine")]
use infrastructure::FastEmbedEngine;
use infrastructure::{
    CachedEmbeddingEngine, OllamaIdeaGenerator, SimpleEmbedEngine, SledCatalogStore,
    SvgPlaceholderRenderer, UploadDirectory,
};
use interfaces::AppState;
use settings::{AppConfig, ConfigManager, EmbeddingBackend, ENV_DATA_DIR};

/// Everything the server needs, built once at process start.
pub struct AppHandles {
    pub catalog: Arc<CatalogService>,
    pub studio: Arc<StudioService>,
    pub config: Arc<ConfigManager>,
    /// Present when `recommend.cache_capacity` is non-zero.
    pub embedding_cache: Option<Arc<CachedEmbeddingEngine>>,
}

impl AppHandles {
    pub fn state(&self) -> AppState {
        AppState {
            catalog: Arc::clone(&self.catalog),
            studio: Arc::clone(&self.studio),
        }
    }
}

/// Installs the global tracing subscriber; later calls are no-ops.
pub fn init_tracing() {
    static INIT: std::sync::OnceLock<()> = std::sync::OnceLock::new();

    let _ = INIT.get_or_init(|| {
        let filter = std::env::var("INKMATCH_LOG").unwrap_or_else(|_| "info,inkmatch=debug".into());
        let _ = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(true)
            .with_writer(std::io::stderr)
            .compact()
            .try_init();
    });
}

/// Bootstraps against the default data directory.
pub fn build_environment() -> Result<AppHandles> {
    let data_dir = resolve_data_dir()?;
    build_environment_at(&data_dir)
}

/// Bootstraps config, storage, the embedding model and services under `data_dir`.
pub fn build_environment_at(data_dir: &Path) -> Result<AppHandles> {
    std::fs::create_dir_all(data_dir).context("failed to create data directory")?;

    let config =
        Arc::new(ConfigManager::load_with_env(data_dir).context("failed to load config file")?);
    if let Err(err) = config.write_defaults_if_missing() {
        warn!(target: "inkmatch::bootstrap", %err, "could not write default config");
    }
    let active = config.current();

    let store_path = data_dir.join("store");
    let store = SledCatalogStore::open(&store_path)
        .map_err(|err| anyhow!(err.to_string()))
        .context("failed to open catalog store")?;

    let uploads = UploadDirectory::open(config.uploads_dir())
        .map_err(|err| anyhow!(err.to_string()))
        .context("failed to prepare uploads directory")?;

    let base = init_embedder(&active).context("failed to initialise embedding backend")?;
    let capacity = active.recommend.cache_capacity;
    let embedding_cache = (capacity > 0)
        .then(|| Arc::new(CachedEmbeddingEngine::new(Arc::clone(&base), capacity)));
    let embedder: Arc<dyn EmbeddingEngine> = match &embedding_cache {
        Some(cache) => Arc::clone(cache) as Arc<dyn EmbeddingEngine>,
        None => base,
    };
    info!(
        target: "inkmatch::bootstrap",
        backend = active.embedding.id(),
        model = embedder.model_name(),
        dims = ?embedder.dims(),
        cache_capacity = capacity,
        "embedding engine ready"
    );

    let catalog = Arc::new(CatalogService::new(
        Arc::new(store),
        Arc::new(uploads),
        SimilarityRanker::new(embedder),
        ServiceConfig::new(active.recommend.top_k),
    ));

    let ideas = OllamaIdeaGenerator::new(
        active.llm.base_url.clone(),
        active.llm.model.clone(),
        active.llm.max_tokens,
        active.llm.temperature,
        Duration::from_secs(active.llm.timeout_secs.max(1)),
    );
    let studio = Arc::new(StudioService::new(
        Arc::new(ideas),
        Arc::new(SvgPlaceholderRenderer::new()),
    ));

    Ok(AppHandles {
        catalog,
        studio,
        config,
        embedding_cache,
    })
}

fn init_embedder(config: &AppConfig) -> Result<Arc<dyn EmbeddingEngine>> {
    Ok(match &config.embedding {
        EmbeddingBackend::Simple { model, dimensions } => Arc::new(
            SimpleEmbedEngine::try_new(model.clone(), *dimensions)
                .map_err(|err| anyhow!(err.to_string()))?,
        ),
        #[cfg(feature = "fastembed-engine")]
        EmbeddingBackend::FastEmbed { model } => {
            Arc::new(FastEmbedEngine::try_new(model).map_err(|err| anyhow!(err.to_string()))?)
        }
    })
}

fn resolve_data_dir() -> Result<PathBuf> {
    if let Ok(dir) = std::env::var(ENV_DATA_DIR) {
        return Ok(PathBuf::from(dir));
    }
    let dirs = directories::ProjectDirs::from("dev", "inkmatch", "Inkmatch")
        .ok_or_else(|| anyhow!("unable to determine OS data dir"))?;
    Ok(dirs.data_dir().to_path_buf())
}

/// Serves the HTTP API until Ctrl+C.
pub async fn serve(handles: AppHandles) -> Result<()> {
    let settings = handles.config.current().server;
    let app = interfaces::router(handles.state(), &settings)?;

    let addr: SocketAddr = format!("{}:{}", settings.host, settings.port)
        .parse()
        .with_context(|| format!("invalid bind address {}:{}", settings.host, settings.port))?;

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;

    info!(
        target: "inkmatch::server",
        %addr,
        data_dir = %handles.config.data_dir().display(),
        uploads = %handles.catalog.uploads_root().display(),
        "inkmatch listening"
    );

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            if let Err(err) = tokio::signal::ctrl_c().await {
                warn!(target: "inkmatch::server", %err, "failed to listen for shutdown signal");
            }
        })
        .await
        .context("server failed")?;

    if let Some(cache) = &handles.embedding_cache {
        info!(target: "inkmatch::server", entries = cache.len(), "embedding cache at shutdown");
    }
    info!(target: "inkmatch::server", "shut down");
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::fs;

    use serde_json::json;

    use super::*;
    use crate::domain::NewTattoo;

    fn write_config(dir: &Path, config: serde_json::Value) {
        fs::write(dir.join("config.json"), config.to_string()).unwrap();
    }

    fn upload(catalog: &CatalogService, name: &str, description: &str) {
        catalog
            .upload(NewTattoo {
                name: name.into(),
                description: description.into(),
                file_name: format!("{}.png", name.to_lowercase()),
                bytes: b"png".to_vec(),
            })
            .unwrap();
    }

    #[test]
    fn configured_settings_reach_the_catalog() {
        let dir = tempfile::tempdir().unwrap();
        let art = dir.path().join("art");
        write_config(
            dir.path(),
            json!({
                "embedding": { "backend": "simple", "model": "test/simple", "dimensions": 512 },
                "recommend": { "top_k": 2, "cache_capacity": 16 },
                "uploads_dir": &art,
            }),
        );

        let handles = build_environment_at(dir.path()).unwrap();
        let catalog = &handles.catalog;
        assert_eq!(catalog.model_name(), "test/simple");
        assert_eq!(catalog.uploads_root(), art.as_path());

        upload(catalog, "Koi", "koi fish in waves");
        upload(catalog, "Dragon", "dragon on a mountain");
        upload(catalog, "Rose", "rose with thorns");
        upload(catalog, "Wolf", "wolf howling at the moon");
        assert!(art.join("wolf.png").exists());

        let results = catalog.recommend("a fierce dragon").unwrap();
        assert_eq!(results.len(), 2);
        assert_eq!(results[0].name, "Dragon");

        let cache = handles.embedding_cache.as_ref().unwrap();
        assert!(!cache.is_empty());
    }

    #[test]
    fn cache_and_uploads_default_when_unset() {
        let dir = tempfile::tempdir().unwrap();
        write_config(
            dir.path(),
            json!({ "embedding": { "backend": "simple" } }),
        );

        let handles = build_environment_at(dir.path()).unwrap();
        assert!(handles.embedding_cache.is_none());
        assert_eq!(handles.catalog.uploads_root(), dir.path().join("uploads"));
        assert_eq!(
            handles.catalog.model_name(),
            infrastructure::embeddings::simple_engine::DEFAULT_SIMPLE_MODEL
        );
    }

    #[test]
    fn invalid_embedding_config_aborts_startup() {
        let dir = tempfile::tempdir().unwrap();
        write_config(
            dir.path(),
            json!({ "embedding": { "backend": "simple", "dimensions": 0 } }),
        );

        let err = build_environment_at(dir.path()).err().unwrap();
        assert!(format!("{err:#}").contains("embedding"));
    }
}
