//! Inference backends for FarmAgent
//!
//! A primary (remote) and a fallback (local) backend behind one trait.

use std::sync::Arc;

use tracing::{debug, info, warn};

mod anthropic;
pub mod client;
mod error;
mod http;
mod local;
mod openai;
mod types;

pub use anthropic::AnthropicClient;
pub use client::LlmClient;
pub use error::LlmError;
pub use local::LocalClient;
pub use openai::OpenAIClient;
pub use types::{CompletionRequest, CompletionResponse, StopReason, TokenUsage};

use crate::config::{Config, RemoteConfig};

/// The configured inference backends
///
/// Either slot may be empty. `remote_auth_missing` records that a remote
/// backend was selected but its credential is absent.
#[derive(Clone, Default)]
pub struct Backends {
    pub primary: Option<Arc<dyn LlmClient>>,
    pub fallback: Option<Arc<dyn LlmClient>>,
    pub remote_auth_missing: bool,
}

impl Backends {
    /// Build both slots from configuration
    ///
    /// A missing credential or model artifact silently disables that backend.
    /// An unknown provider name is a configuration error.
    pub fn from_config(config: &Config) -> Result<Self, LlmError> {
        debug!(remote_enabled = config.remote.enabled, "Backends::from_config: called");
        let mut backends = Self::default();

        if config.remote.enabled {
            match config.remote.get_api_key() {
                Some(key) => {
                    let client = create_remote_client(&config.remote, key)?;
                    info!(backend = %client.label(), "Remote inference backend enabled");
                    backends.primary = Some(client);
                }
                None => {
                    warn!(
                        env = %config.remote.api_key_env,
                        "Remote inference backend disabled: credential not set"
                    );
                    backends.remote_auth_missing = true;
                }
            }
        }

        match config.local.artifact() {
            Some(artifact) => {
                let client: Arc<dyn LlmClient> = Arc::new(LocalClient::new(artifact, &config.local)?);
                info!(backend = %client.label(), "Local inference backend enabled");
                backends.fallback = Some(client);
            }
            None => {
                if let Some(path) = &config.local.model_path {
                    warn!(path = %path.display(), "Local inference backend disabled: model artifact not found");
                } else {
                    debug!("Backends::from_config: no local model configured");
                }
            }
        }

        Ok(backends)
    }

    /// Explicit backends, mainly for tests and embedding
    pub fn new(primary: Option<Arc<dyn LlmClient>>, fallback: Option<Arc<dyn LlmClient>>) -> Self {
        Self {
            primary,
            fallback,
            remote_auth_missing: false,
        }
    }

    /// True when no backend could possibly be attempted
    pub fn is_empty(&self) -> bool {
        self.primary.is_none() && self.fallback.is_none()
    }
}

impl std::fmt::Debug for Backends {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Backends")
            .field("primary", &self.primary.as_ref().map(|c| c.label()))
            .field("fallback", &self.fallback.as_ref().map(|c| c.label()))
            .field("remote_auth_missing", &self.remote_auth_missing)
            .finish()
    }
}

/// Create the remote client for the configured provider
///
/// Supports "openai" (any OpenAI-compatible endpoint) and "anthropic".
pub fn create_remote_client(config: &RemoteConfig, api_key: String) -> Result<Arc<dyn LlmClient>, LlmError> {
    debug!(provider = %config.provider, model = %config.model, "create_remote_client: called");
    match config.provider.as_str() {
        "openai" => Ok(Arc::new(OpenAIClient::from_config(config, api_key)?)),
        "anthropic" => Ok(Arc::new(AnthropicClient::from_config(config, api_key)?)),
        other => Err(LlmError::InvalidResponse(format!(
            "Unknown LLM provider: '{}'. Supported: openai, anthropic",
            other
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use std::path::PathBuf;

    fn config_with_key_env(env: &str) -> Config {
        let mut config = Config::default();
        config.remote.api_key_env = env.to_string();
        config
    }

    #[test]
    #[serial]
    fn test_missing_credential_disables_remote() {
        let config = config_with_key_env("FARMAGENT_TEST_UNSET_KEY");
        let backends = Backends::from_config(&config).unwrap();

        assert!(backends.primary.is_none());
        assert!(backends.fallback.is_none());
        assert!(backends.remote_auth_missing);
        assert!(backends.is_empty());
    }

    #[test]
    #[serial]
    fn test_credential_enables_remote() {
        unsafe {
            std::env::set_var("FARMAGENT_TEST_SET_KEY", "hf_test");
        }
        let config = config_with_key_env("FARMAGENT_TEST_SET_KEY");
        let backends = Backends::from_config(&config);
        unsafe {
            std::env::remove_var("FARMAGENT_TEST_SET_KEY");
        }

        let backends = backends.unwrap();
        assert!(backends.primary.is_some());
        assert!(!backends.remote_auth_missing);
    }

    #[test]
    fn test_remote_disabled_records_nothing() {
        let mut config = Config::default();
        config.remote.enabled = false;
        let backends = Backends::from_config(&config).unwrap();
        assert!(backends.is_empty());
        assert!(!backends.remote_auth_missing);
    }

    #[test]
    fn test_local_requires_existing_artifact() {
        let temp = tempfile::TempDir::new().unwrap();
        let mut config = Config::default();
        config.remote.enabled = false;
        config.local.model_path = Some(temp.path().join("absent.gguf"));
        assert!(Backends::from_config(&config).unwrap().fallback.is_none());

        let artifact: PathBuf = temp.path().join("farm.gguf");
        std::fs::write(&artifact, b"gguf").unwrap();
        config.local.model_path = Some(artifact);
        let backends = Backends::from_config(&config).unwrap();
        assert_eq!(backends.fallback.map(|c| c.label()), Some("local:farm".to_string()));
    }

    #[test]
    fn test_unknown_provider_rejected() {
        let remote = RemoteConfig {
            provider: "bard".to_string(),
            ..Default::default()
        };
        assert!(create_remote_client(&remote, "key".to_string()).is_err());
    }
}
