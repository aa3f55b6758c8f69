//! Layered configuration for the search core.
//!
//! Sources, later ones winning:
//! - Default values
//! - TOML configuration file (`.clipmark/settings.toml`)
//! - Environment variable overrides
//!
//! # Environment Variables
//!
//! Environment variables must be prefixed with `CLIPMARK_` and use double
//! underscores to separate nested levels:
//! - `CLIPMARK_INDEX__KIND=ivf` sets `index.kind`
//! - `CLIPMARK_INDEX__IVF__PROBES=8` sets `index.ivf.probes`
//! - `CLIPMARK_RANKING__STRONG=35` sets `ranking.strong`

use crate::ranking::RankingWeights;
use crate::vector::{
    DEFAULT_RECALL_WINDOW, IndexKind, IndexOptions, IvfParams, VectorDimension,
};
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Name of the per-workspace configuration directory.
pub const CONFIG_DIR: &str = ".clipmark";

/// Prefix of environment variable overrides.
pub const ENV_PREFIX: &str = "CLIPMARK_";

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct Settings {
    /// Version of the configuration schema
    #[serde(default = "default_version")]
    pub version: u32,

    /// Workspace root directory (where .clipmark is located)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub workspace_root: Option<PathBuf>,

    /// Global debug mode
    #[serde(default = "default_false")]
    pub debug: bool,

    #[serde(default)]
    pub index: IndexConfig,

    #[serde(default)]
    pub ranking: RankingWeights,

    #[serde(default)]
    pub embedding: EmbeddingConfig,

    #[serde(default)]
    pub search: SearchConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct IndexConfig {
    /// Similarity structure: "flat" (exact) or "ivf" (clustered, quantized)
    #[serde(default)]
    pub kind: IndexKind,

    /// Embedding dimension; must match the model
    #[serde(default)]
    pub dimension: VectorDimension,

    /// Candidates recalled from the index per search
    #[serde(default = "default_recall_window")]
    pub recall_window: usize,

    #[serde(default)]
    pub ivf: IvfParams,
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct EmbeddingConfig {
    /// fastembed model name
    #[serde(default = "default_embedding_model")]
    pub model: String,

    /// Where downloaded models are cached; relative paths resolve against
    /// the workspace root
    #[serde(default = "default_cache_dir")]
    pub cache_dir: PathBuf,

    #[serde(default = "default_false")]
    pub show_download_progress: bool,
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq, Default)]
pub struct SearchConfig {
    /// Per-search deadline in milliseconds; 0 disables it
    #[serde(default)]
    pub deadline_ms: u64,
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct LoggingConfig {
    /// `EnvFilter` directive used when `RUST_LOG` is unset
    #[serde(default = "default_log_filter")]
    pub filter: String,
}

// Default value functions
fn default_version() -> u32 {
    1
}
fn default_false() -> bool {
    false
}
fn default_recall_window() -> usize {
    DEFAULT_RECALL_WINDOW
}
fn default_embedding_model() -> String {
    "AllMiniLML6V2".to_string()
}
fn default_cache_dir() -> PathBuf {
    PathBuf::from(CONFIG_DIR).join("models")
}
fn default_log_filter() -> String {
    "info".to_string()
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            version: default_version(),
            workspace_root: None,
            debug: false,
            index: IndexConfig::default(),
            ranking: RankingWeights::default(),
            embedding: EmbeddingConfig::default(),
            search: SearchConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

impl Default for IndexConfig {
    fn default() -> Self {
        Self {
            kind: IndexKind::default(),
            dimension: VectorDimension::default(),
            recall_window: default_recall_window(),
            ivf: IvfParams::default(),
        }
    }
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            model: default_embedding_model(),
            cache_dir: default_cache_dir(),
            show_download_progress: false,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter: default_log_filter(),
        }
    }
}

impl IndexConfig {
    pub fn options(&self) -> IndexOptions {
        IndexOptions {
            kind: self.kind,
            dimension: self.dimension,
            recall_window: self.recall_window,
            ivf: self.ivf.clone(),
        }
    }
}

impl SearchConfig {
    pub fn deadline(&self) -> Option<Duration> {
        (self.deadline_ms > 0).then(|| Duration::from_millis(self.deadline_ms))
    }
}

impl Settings {
    /// Load configuration from all sources, starting the workspace search
    /// at the current directory
    pub fn load() -> Result<Self, Box<figment::Error>> {
        let current = std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."));
        Self::load_in(&current)
    }

    /// Load configuration for the workspace enclosing `start`
    pub fn load_in(start: &Path) -> Result<Self, Box<figment::Error>> {
        let workspace_root = Self::find_workspace_root(start);
        let config_path = workspace_root
            .as_deref()
            .unwrap_or(start)
            .join(CONFIG_DIR)
            .join("settings.toml");

        Self::figment(&config_path)
            .extract()
            .map_err(Box::new)
            .map(|mut settings: Settings| {
                if settings.workspace_root.is_none() {
                    settings.workspace_root = workspace_root;
                }
                settings
            })
    }

    /// Load configuration from a specific file
    pub fn load_from(path: impl AsRef<Path>) -> Result<Self, Box<figment::Error>> {
        Self::figment(path.as_ref()).extract().map_err(Box::new)
    }

    fn figment(config_path: &Path) -> Figment {
        Figment::new()
            .merge(Serialized::defaults(Settings::default()))
            // Missing files are skipped
            .merge(Toml::file(config_path))
            // Double underscore separates nested levels; single underscores
            // stay within field names
            .merge(Env::prefixed(ENV_PREFIX).map(|key| {
                key.as_str().to_lowercase().replace("__", ".").into()
            }))
    }

    /// Nearest ancestor of `start` containing a `.clipmark` directory
    pub fn find_workspace_root(start: &Path) -> Option<PathBuf> {
        start
            .ancestors()
            .find(|ancestor| ancestor.join(CONFIG_DIR).is_dir())
            .map(Path::to_path_buf)
    }

    /// Model cache directory, anchored at the workspace root when relative
    pub fn model_cache_dir(&self) -> PathBuf {
        match &self.workspace_root {
            Some(root) if self.embedding.cache_dir.is_relative() => {
                root.join(&self.embedding.cache_dir)
            }
            _ => self.embedding.cache_dir.clone(),
        }
    }

    /// Save current configuration to file
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), Box<dyn std::error::Error>> {
        let parent = path.as_ref().parent().ok_or("Invalid path")?;
        std::fs::create_dir_all(parent)?;

        let toml_string = toml::to_string_pretty(self)?;
        std::fs::write(path, toml_string)?;

        Ok(())
    }
}
