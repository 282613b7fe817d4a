//! FarmAgent configuration types and loading

use eyre::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Local model artifact path (absence disables the local backend)
pub const MODEL_PATH_ENV: &str = "FARMAGENT_MODEL_PATH";

/// Document index directory
pub const INDEX_DIR_ENV: &str = docstore::config::INDEX_DIR_ENV;

/// Comma-separated domain allow-list override
pub const ALLOWED_DOMAINS_ENV: &str = "FARMAGENT_ALLOWED_DOMAINS";

/// Golden example file
pub const GOLDEN_PATH_ENV: &str = "FARMAGENT_GOLDEN_PATH";

/// Trusted agronomy sources; entries match the domain itself and its subdomains
pub const DEFAULT_ALLOWED_DOMAINS: &[&str] = &[
    "fao.org",
    "usda.gov",
    "icar.org.in",
    "ipm.ucanr.edu",
    "extension.psu.edu",
    "cals.cornell.edu",
    "extension.org",
    "garden.org",
    ".edu",
    ".ac.uk",
];

/// Main FarmAgent configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Log level (TRACE, DEBUG, INFO, WARN, ERROR)
    #[serde(rename = "log-level")]
    pub log_level: Option<String>,

    /// Primary (remote) inference backend
    pub remote: RemoteConfig,

    /// Fallback (local) inference backend
    pub local: LocalConfig,

    /// Orchestrator settings
    pub agent: AgentConfig,

    /// Document index
    pub retrieval: RetrievalConfig,

    /// Trust-gated fetch
    pub fetch: FetchConfig,

    /// Constrained web search
    pub search: SearchToolConfig,

    /// Golden example file (missing file falls back to the built-in exemplar)
    #[serde(rename = "golden-path")]
    pub golden_path: Option<PathBuf>,

    /// Directory with prompt template overrides
    #[serde(rename = "prompts-dir")]
    pub prompts_dir: Option<PathBuf>,
}

impl Config {
    /// Load configuration with fallback chain, then apply environment overrides
    pub fn load(config_path: Option<&PathBuf>) -> Result<Self> {
        let mut config = Self::load_file_chain(config_path)?;
        config.apply_env_overrides();
        Ok(config)
    }

    /// Read only the log level, before logging is initialized
    pub fn load_log_level(config_path: Option<&PathBuf>) -> Option<String> {
        Self::load_file_chain(config_path).ok().and_then(|c| c.log_level)
    }

    fn load_file_chain(config_path: Option<&PathBuf>) -> Result<Self> {
        // If explicit config path provided, try to load it
        if let Some(path) = config_path {
            return Self::load_from_file(path).context(format!("Failed to load config from {}", path.display()));
        }

        // Try project-local config: .farmagent.yml
        let local_config = PathBuf::from(".farmagent.yml");
        if local_config.exists() {
            match Self::load_from_file(&local_config) {
                Ok(config) => return Ok(config),
                Err(e) => {
                    tracing::warn!("Failed to load config from {}: {}", local_config.display(), e);
                }
            }
        }

        // Try user config: ~/.config/farmagent/farmagent.yml
        if let Some(config_dir) = dirs::config_dir() {
            let user_config = config_dir.join("farmagent").join("farmagent.yml");
            if user_config.exists() {
                match Self::load_from_file(&user_config) {
                    Ok(config) => return Ok(config),
                    Err(e) => {
                        tracing::warn!("Failed to load config from {}: {}", user_config.display(), e);
                    }
                }
            }
        }

        tracing::info!("No config file found, using defaults");
        Ok(Self::default())
    }

    fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(&path).context("Failed to read config file")?;

        let config: Self = serde_yaml::from_str(&content).context("Failed to parse config file")?;

        tracing::info!("Loaded config from: {}", path.as_ref().display());
        Ok(config)
    }

    /// Apply `FARMAGENT_*` environment overrides
    pub fn apply_env_overrides(&mut self) {
        if let Some(path) = non_empty_env(MODEL_PATH_ENV) {
            debug!(%path, "apply_env_overrides: local model path");
            self.local.model_path = Some(PathBuf::from(path));
        }
        if let Some(dir) = non_empty_env(INDEX_DIR_ENV) {
            debug!(%dir, "apply_env_overrides: index dir");
            self.retrieval.index_dir = PathBuf::from(dir);
        }
        if let Some(list) = non_empty_env(ALLOWED_DOMAINS_ENV) {
            let domains: Vec<String> = list
                .split(',')
                .map(|d| d.trim().to_lowercase())
                .filter(|d| !d.is_empty())
                .collect();
            debug!(?domains, "apply_env_overrides: allowed domains");
            if !domains.is_empty() {
                self.fetch.allowed_domains = domains;
            }
        }
        if let Some(path) = non_empty_env(GOLDEN_PATH_ENV) {
            debug!(%path, "apply_env_overrides: golden path");
            self.golden_path = Some(PathBuf::from(path));
        }
    }

    /// Golden example file, defaulting to `data/golden_examples.json`
    pub fn golden_path(&self) -> PathBuf {
        self.golden_path
            .clone()
            .unwrap_or_else(|| PathBuf::from("data").join("golden_examples.json"))
    }
}

fn non_empty_env(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.trim().is_empty())
}

/// Remote inference provider configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RemoteConfig {
    /// Whether a remote backend is selected at all
    pub enabled: bool,

    /// Provider name ("openai" for any OpenAI-compatible endpoint, or "anthropic")
    pub provider: String,

    /// Model identifier
    pub model: String,

    /// Environment variable containing the API key
    #[serde(rename = "api-key-env")]
    pub api_key_env: String,

    /// API base URL
    #[serde(rename = "base-url")]
    pub base_url: String,

    /// Request timeout in milliseconds
    #[serde(rename = "timeout-ms")]
    pub timeout_ms: u64,

    /// Retries for transient HTTP errors
    #[serde(rename = "max-retries")]
    pub max_retries: u32,
}

impl Default for RemoteConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            provider: "openai".to_string(),
            model: "mistralai/Mistral-7B-Instruct-v0.2".to_string(),
            api_key_env: "HF_TOKEN".to_string(),
            base_url: "https://router.huggingface.co".to_string(),
            timeout_ms: 120_000,
            max_retries: 2,
        }
    }
}

impl RemoteConfig {
    /// The credential, if the configured environment variable is set and non-empty
    pub fn get_api_key(&self) -> Option<String> {
        non_empty_env(&self.api_key_env)
    }
}

/// Local inference configuration (an OpenAI-compatible server such as llama.cpp's `llama-server`)
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LocalConfig {
    /// Path to the model artifact (e.g. a GGUF file)
    #[serde(rename = "model-path")]
    pub model_path: Option<PathBuf>,

    /// Base URL of the local server
    #[serde(rename = "base-url")]
    pub base_url: String,

    /// Request timeout in milliseconds
    #[serde(rename = "timeout-ms")]
    pub timeout_ms: u64,

    /// Retries for transient HTTP errors
    #[serde(rename = "max-retries")]
    pub max_retries: u32,
}

impl Default for LocalConfig {
    fn default() -> Self {
        Self {
            model_path: None,
            base_url: "http://127.0.0.1:8080".to_string(),
            timeout_ms: 600_000,
            max_retries: 0,
        }
    }
}

impl LocalConfig {
    /// The model artifact, only if it exists on disk
    pub fn artifact(&self) -> Option<&Path> {
        self.model_path.as_deref().filter(|p| p.is_file())
    }
}

/// Orchestrator settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AgentConfig {
    /// Documents requested from retrieval per query
    #[serde(rename = "top-k")]
    pub top_k: usize,

    /// Output token budget per inference call
    #[serde(rename = "max-output-tokens")]
    pub max_output_tokens: u32,

    /// Upper bound for any single tool invocation
    #[serde(rename = "tool-timeout-ms")]
    pub tool_timeout_ms: u64,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            top_k: 3,
            max_output_tokens: 1024,
            tool_timeout_ms: 60_000,
        }
    }
}

/// Document index configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RetrievalConfig {
    /// Directory of the persistent document index
    #[serde(rename = "index-dir")]
    pub index_dir: PathBuf,
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            index_dir: docstore::config::default_store_path(),
        }
    }
}

/// Trust-gated fetch configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FetchConfig {
    /// Domain suffixes a fetch may retrieve from
    #[serde(rename = "allowed-domains")]
    pub allowed_domains: Vec<String>,

    /// Request timeout in milliseconds
    #[serde(rename = "timeout-ms")]
    pub timeout_ms: u64,

    /// Extracted text shorter than this is reported as a warning
    #[serde(rename = "min-content-chars")]
    pub min_content_chars: usize,

    /// Responses larger than this are refused
    #[serde(rename = "max-body-bytes")]
    pub max_body_bytes: usize,

    #[serde(rename = "user-agent")]
    pub user_agent: String,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            allowed_domains: DEFAULT_ALLOWED_DOMAINS.iter().map(|d| d.to_string()).collect(),
            timeout_ms: 10_000,
            min_content_chars: 100,
            max_body_bytes: 1_000_000,
            user_agent: format!("FarmAgent/{} (research; verified agronomy sources)", env!("CARGO_PKG_VERSION")),
        }
    }
}

/// Constrained web search configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchToolConfig {
    /// Hits taken from the search engine
    #[serde(rename = "max-results")]
    pub max_results: usize,

    /// Characters kept from each fetched page
    #[serde(rename = "max-chars-per-hit")]
    pub max_chars_per_hit: usize,

    /// Search engine request timeout in milliseconds
    #[serde(rename = "timeout-ms")]
    pub timeout_ms: u64,
}

impl Default for SearchToolConfig {
    fn default() -> Self {
        Self {
            max_results: 3,
            max_chars_per_hit: 2000,
            timeout_ms: 30_000,
        }
    }
}
