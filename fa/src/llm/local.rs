//! Local inference backend
//!
//! A model artifact served by an OpenAI-compatible local server such as
//! llama.cpp's `llama-server`. The backend exists only when the artifact does.

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::debug;

use super::{CompletionRequest, CompletionResponse, LlmClient, LlmError, OpenAIClient};
use crate::config::LocalConfig;

/// Local model client
pub struct LocalClient {
    artifact: PathBuf,
    inner: OpenAIClient,
}

impl LocalClient {
    /// Create a client for `artifact`; the model name sent is the file stem
    pub fn new(artifact: &Path, config: &LocalConfig) -> Result<Self, LlmError> {
        debug!(artifact = %artifact.display(), base_url = %config.base_url, "LocalClient::new: called");
        let model = artifact
            .file_stem()
            .and_then(|s| s.to_str())
            .ok_or_else(|| LlmError::InvalidResponse(format!("Invalid model artifact path: {}", artifact.display())))?;

        let inner = OpenAIClient::new(
            model,
            config.base_url.clone(),
            None,
            Duration::from_millis(config.timeout_ms),
            config.max_retries,
        )?;

        Ok(Self {
            artifact: artifact.to_path_buf(),
            inner,
        })
    }

    pub fn artifact(&self) -> &Path {
        &self.artifact
    }
}

#[async_trait]
impl LlmClient for LocalClient {
    fn label(&self) -> String {
        format!("local:{}", self.inner.model())
    }

    async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse, LlmError> {
        debug!(artifact = %self.artifact.display(), "LocalClient::complete: called");
        self.inner.complete(request).await
    }
}
