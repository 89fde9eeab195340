use std::fs;
use std::path::{Path, PathBuf};

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::application::services::DEFAULT_TOP_K;
use crate::infrastructure::embeddings::simple_engine::{
    DEFAULT_SIMPLE_DIMENSIONS, DEFAULT_SIMPLE_MODEL,
};
use crate::infrastructure::llm::{DEFAULT_LLM_BASE_URL, DEFAULT_LLM_MODEL};

/// Default filename used to persist configuration within the data directory.
const CONFIG_FILENAME: &str = "config.json";

pub const ENV_DATA_DIR: &str = "INKMATCH_DATA_DIR";
pub const ENV_HOST: &str = "INKMATCH_HOST";
pub const ENV_PORT: &str = "INKMATCH_PORT";
pub const ENV_UPLOADS_DIR: &str = "INKMATCH_UPLOADS_DIR";
pub const ENV_LLM_URL: &str = "INKMATCH_LLM_URL";
pub const ENV_LLM_MODEL: &str = "INKMATCH_LLM_MODEL";

/// Declarative list of embedding backends compiled into the binary.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "backend", rename_all = "kebab-case")]
pub enum EmbeddingBackend {
    /// Lightweight deterministic hash embedder (always available).
    Simple {
        #[serde(default = "default_simple_model")]
        model: String,
        #[serde(default = "default_simple_dim")]
        dimensions: usize,
    },
    /// Semantic sentence embeddings powered by FastEmbed (feature gated).
    #[cfg(feature = "fastembed-engine")]
    FastEmbed {
        #[serde(default = "default_fastembed_model")]
        model: String,
    },
}

impl EmbeddingBackend {
    pub fn id(&self) -> &'static str {
        match self {
            EmbeddingBackend::Simple { .. } => "simple",
            #[cfg(feature = "fastembed-engine")]
            EmbeddingBackend::FastEmbed { .. } => "fastembed",
        }
    }
}

impl Default for EmbeddingBackend {
    fn default() -> Self {
        #[cfg(feature = "fastembed-engine")]
        {
            EmbeddingBackend::FastEmbed {
                model: default_fastembed_model(),
            }
        }
        #[cfg(not(feature = "fastembed-engine"))]
        {
            EmbeddingBackend::Simple {
                model: default_simple_model(),
                dimensions: default_simple_dim(),
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerSettings {
    pub host: String,
    pub port: u16,
    pub cors_origin: String,
    pub max_upload_bytes: usize,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".into(),
            port: 8000,
            cors_origin: "http://localhost:5173".into(),
            max_upload_bytes: 10 * 1024 * 1024,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmSettings {
    pub base_url: String,
    pub model: String,
    pub max_tokens: u32,
    pub temperature: f32,
    pub timeout_secs: u64,
}

impl Default for LlmSettings {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_LLM_BASE_URL.into(),
            model: DEFAULT_LLM_MODEL.into(),
            max_tokens: 100,
            temperature: 0.8,
            timeout_secs: 60,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RecommendSettings {
    pub top_k: usize,
    /// Entries kept by the description embedding cache; `0` disables it.
    pub cache_capacity: usize,
}

impl Default for RecommendSettings {
    fn default() -> Self {
        Self {
            top_k: DEFAULT_TOP_K,
            cache_capacity: 0,
        }
    }
}

/// Complete persisted configuration payload.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub embedding: EmbeddingBackend,
    pub server: ServerSettings,
    pub llm: LlmSettings,
    pub recommend: RecommendSettings,
    /// Defaults to `<data_dir>/uploads`.
    pub uploads_dir: Option<PathBuf>,
}

impl AppConfig {
    /// Applies `INKMATCH_*` overrides read through `lookup`.
    pub fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(host) = lookup(ENV_HOST) {
            self.server.host = host;
        }
        if let Some(raw) = lookup(ENV_PORT) {
            match raw.parse() {
                Ok(port) => self.server.port = port,
                Err(err) => warn!(value = %raw, %err, "ignoring invalid {ENV_PORT}"),
            }
        }
        if let Some(dir) = lookup(ENV_UPLOADS_DIR) {
            self.uploads_dir = Some(PathBuf::from(dir));
        }
        if let Some(url) = lookup(ENV_LLM_URL) {
            self.llm.base_url = url;
        }
        if let Some(model) = lookup(ENV_LLM_MODEL) {
            self.llm.model = model;
        }
    }
}

/// Thread-safe manager responsible for loading and persisting `AppConfig`.
pub struct ConfigManager {
    path: PathBuf,
    data_dir: PathBuf,
    state: RwLock<AppConfig>,
}

impl ConfigManager {
    /// Create a manager rooted at `data_dir`. The JSON file will be located at
    /// `<data_dir>/config.json`; a missing or unreadable file yields defaults.
    pub fn load(data_dir: impl AsRef<Path>) -> std::io::Result<Self> {
        let data_dir = data_dir.as_ref().to_path_buf();
        let path = data_dir.join(CONFIG_FILENAME);
        let config = if path.exists() {
            let bytes = fs::read(&path)?;
            serde_json::from_slice::<AppConfig>(&bytes).unwrap_or_else(|err| {
                warn!(path = %path.display(), %err, "unreadable config, using defaults");
                AppConfig::default()
            })
        } else {
            AppConfig::default()
        };

        Ok(Self {
            path,
            data_dir,
            state: RwLock::new(config),
        })
    }

    /// Like `load`, then layers environment overrides on top.
    pub fn load_with_env(data_dir: impl AsRef<Path>) -> std::io::Result<Self> {
        let manager = Self::load(data_dir)?;
        manager
            .state
            .write()
            .apply_overrides(|key| std::env::var(key).ok());
        Ok(manager)
    }

    /// Snapshot of the current configuration.
    pub fn current(&self) -> AppConfig {
        self.state.read().clone()
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    pub fn uploads_dir(&self) -> PathBuf {
        self.state
            .read()
            .uploads_dir
            .clone()
            .unwrap_or_else(|| self.data_dir.join("uploads"))
    }

    /// Writes the current configuration if no file exists yet, so operators
    /// have something to edit.
    pub fn write_defaults_if_missing(&self) -> std::io::Result<bool> {
        if self.path.exists() {
            return Ok(false);
        }
        let config = self.current();
        self.persist(&config)?;
        Ok(true)
    }

    /// Ensure the backing directory exists and write the JSON payload.
    fn persist(&self, config: &AppConfig) -> std::io::Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let payload = serde_json::to_vec_pretty(config)?;
        fs::write(&self.path, payload)
    }
}

fn default_simple_dim() -> usize {
    DEFAULT_SIMPLE_DIMENSIONS
}

fn default_simple_model() -> String {
    DEFAULT_SIMPLE_MODEL.to_string()
}

#[cfg(feature = "fastembed-engine")]
fn default_fastembed_model() -> String {
    crate::infrastructure::embeddings::fastembed_engine::DEFAULT_FASTEMBED_MODEL.to_string()
}
