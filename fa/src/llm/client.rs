//! LlmClient trait definition

use async_trait::async_trait;

use super::{CompletionRequest, CompletionResponse, LlmError};

/// Stateless inference backend - each call is independent
///
/// The agent sends one system prompt and one user message per call and never
/// carries conversation state between queries.
#[async_trait]
pub trait LlmClient: Send + Sync {
    /// Human-readable backend label for logs ("remote:<model>", "local:<model>")
    fn label(&self) -> String;

    /// Send a single completion request
    async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse, LlmError>;
}
