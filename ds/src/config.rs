//! Configuration for docstore

use eyre::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Environment variable overriding the store location
pub const INDEX_DIR_ENV: &str = "FARMAGENT_INDEX_DIR";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Path to the document store directory
    #[serde(default = "default_store_path", rename = "store-path")]
    pub store_path: PathBuf,

    /// Default chunk size in characters
    #[serde(default = "default_chunk_size", rename = "chunk-size")]
    pub chunk_size: usize,

    /// Default overlap between chunks
    #[serde(default = "default_overlap")]
    pub overlap: usize,
}

/// Platform data dir, e.g. `~/.local/share/farmagent/index`
pub fn default_store_path() -> PathBuf {
    dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("farmagent")
        .join("index")
}

fn default_chunk_size() -> usize {
    crate::DEFAULT_CHUNK_SIZE
}

fn default_overlap() -> usize {
    crate::DEFAULT_OVERLAP
}

impl Default for Config {
    fn default() -> Self {
        Self {
            store_path: default_store_path(),
            chunk_size: default_chunk_size(),
            overlap: default_overlap(),
        }
    }
}

impl Config {
    /// Load config from file, or use defaults
    ///
    /// `FARMAGENT_INDEX_DIR` sets the store path when no config file is found.
    pub fn load(path: Option<&PathBuf>) -> Result<Self> {
        if let Some(config_path) = path {
            let content = std::fs::read_to_string(config_path)
                .context(format!("Failed to read {}", config_path.display()))?;
            let config: Config = serde_yaml::from_str(&content).context("Failed to parse config file")?;
            return Ok(config);
        }

        let default_paths = [
            dirs::config_dir().map(|p| p.join("farmagent").join("docstore.yml")),
            Some(PathBuf::from("docstore.yml")),
        ];

        for path in default_paths.iter().flatten() {
            if path.exists() {
                let content = std::fs::read_to_string(path)?;
                let config: Config = serde_yaml::from_str(&content)?;
                return Ok(config);
            }
        }

        let mut config = Config::default();
        if let Ok(dir) = std::env::var(INDEX_DIR_ENV) {
            config.store_path = PathBuf::from(dir);
        }
        Ok(config)
    }
}
