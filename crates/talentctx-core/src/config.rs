//! Configuration loader, typed settings and path helpers.
//!
//! Uses Figment to merge `config.toml` + `config.<env>.toml` + `APP_*` env vars
//! (`__` separates nested keys, e.g. `APP_CACHE__INDEX_DIR`).

use figment::{
    providers::{Env, Format, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};
use std::env;
use std::path::{Path, PathBuf};

use crate::error::Error;

pub struct Config {
    figment: Figment,
}

impl Config {
    pub fn load() -> anyhow::Result<Self> {
        let env_name = env::var("RUST_ENV").unwrap_or_else(|_| "dev".to_string());

        let mut figment = Figment::new().merge(Toml::file("config.toml"));
        match env_name.as_str() {
            "dev" | "development" => figment = figment.merge(Toml::file("config.dev.toml")),
            "prod" | "production" => figment = figment.merge(Toml::file("config.prod.toml")),
            "test" | "testing" => figment = figment.merge(Toml::file("config.test.toml")),
            _ => {}
        }
        figment = figment.merge(Env::prefixed("APP_").split("__"));

        let config = Self { figment };
        config.settings()?.validate()?;
        Ok(config)
    }

    /// Load a single TOML file without environment overlays.
    pub fn load_file(path: &Path) -> anyhow::Result<Self> {
        let config = Self { figment: Figment::new().merge(Toml::file(path)) };
        config.settings()?.validate()?;
        Ok(config)
    }

    pub fn settings(&self) -> anyhow::Result<Settings> {
        self.figment
            .extract()
            .map_err(|e| anyhow::anyhow!("Failed to read settings: {}", e))
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub data: DataSettings,
    pub cache: CacheSettings,
    pub matcher: MatcherSettings,
    pub retrieval: RetrievalSettings,
    pub embedding: EmbeddingSettings,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DataSettings {
    pub dir: String,
}

impl Default for DataSettings {
    fn default() -> Self { Self { dir: "./dev_data".to_string() } }
}

/// What a cached index does when the company's news list changed since it was built.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Staleness {
    /// Keep serving the snapshot the index was built from.
    #[default]
    Pinned,
    /// Rebuild when the current news list hashes differently.
    RebuildOnNewsChange,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheSettings {
    pub index_dir: String,
    pub staleness: Staleness,
}

impl Default for CacheSettings {
    fn default() -> Self { Self { index_dir: "./dev_data/index_cache".to_string(), staleness: Staleness::Pinned } }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MatcherSettings {
    pub fuzzy_threshold: f64,
    pub semantic_threshold: f32,
}

impl Default for MatcherSettings {
    fn default() -> Self { Self { fuzzy_threshold: 85.0, semantic_threshold: 0.90 } }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RetrievalSettings {
    pub top_k: usize,
}

impl Default for RetrievalSettings {
    fn default() -> Self { Self { top_k: 5 } }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EmbeddingSettings {
    pub model_dir: Option<String>,
    pub use_fake: bool,
    pub max_len: usize,
    pub fake_dim: usize,
}

impl Default for EmbeddingSettings {
    fn default() -> Self { Self { model_dir: None, use_fake: false, max_len: 256, fake_dim: 1024 } }
}

impl Settings {
    pub fn validate(&self) -> Result<(), Error> {
        if !(0.0..=100.0).contains(&self.matcher.fuzzy_threshold) {
            return Err(Error::InvalidConfig(format!("matcher.fuzzy_threshold must be in 0..=100, got {}", self.matcher.fuzzy_threshold)));
        }
        if !(-1.0..=1.0).contains(&self.matcher.semantic_threshold) {
            return Err(Error::InvalidConfig(format!("matcher.semantic_threshold must be in -1..=1, got {}", self.matcher.semantic_threshold)));
        }
        if self.embedding.max_len == 0 || self.embedding.fake_dim == 0 {
            return Err(Error::InvalidConfig("embedding.max_len and embedding.fake_dim must be positive".to_string()));
        }
        Ok(())
    }

    pub fn data_dir(&self) -> PathBuf { expand_path(&self.data.dir) }

    pub fn index_dir(&self) -> PathBuf { expand_path(&self.cache.index_dir) }
}

/// Expand a user-provided path string:
/// - Expands leading '~' to the user's home directory
/// - Expands ${VAR} and $VAR environment variables
/// - Returns a PathBuf without attempting to canonicalize
pub fn expand_path<S: AsRef<str>>(input: S) -> PathBuf {
    let s = input.as_ref();
    // Expand env vars first
    let expanded_env = shellexpand::env(s).unwrap_or(std::borrow::Cow::Borrowed(s));
    // Expand ~ at start
    let expanded = shellexpand::tilde(&expanded_env);
    PathBuf::from(expanded.as_ref())
}
