//! Inference request/response types
//!
//! Provider-agnostic: each client maps these onto its own wire format.

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::LlmError;

/// A completion request - everything needed for one inference call
#[derive(Debug, Clone)]
pub struct CompletionRequest {
    /// System prompt (rendered from the Handlebars template)
    pub system_prompt: String,

    /// The single user turn: grounding context plus the query
    pub user_prompt: String,

    /// Sampling temperature; the agent pins this to 0
    pub temperature: f32,

    /// Output token budget
    pub max_tokens: u32,

    /// Ask the backend for JSON-structured output, where supported
    pub json_output: bool,
}

impl CompletionRequest {
    /// A single-turn request with deterministic sampling
    pub fn new(system_prompt: impl Into<String>, user_prompt: impl Into<String>, max_tokens: u32) -> Self {
        Self {
            system_prompt: system_prompt.into(),
            user_prompt: user_prompt.into(),
            temperature: 0.0,
            max_tokens,
            json_output: false,
        }
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    pub fn with_json_output(mut self, json_output: bool) -> Self {
        self.json_output = json_output;
        self
    }
}

/// Response from a completion request
#[derive(Debug, Clone, PartialEq)]
pub struct CompletionResponse {
    /// Text content, if any
    pub content: Option<String>,

    /// Why the model stopped
    pub stop_reason: StopReason,

    /// Token usage for this request
    pub usage: TokenUsage,
}

impl CompletionResponse {
    /// A plain text response, mainly for stubs
    pub fn text(content: impl Into<String>) -> Self {
        Self {
            content: Some(content.into()),
            stop_reason: StopReason::EndTurn,
            usage: TokenUsage::default(),
        }
    }

    /// The generated text; an absent or blank completion is an error
    pub fn into_text(self) -> Result<String, LlmError> {
        debug!(stop_reason = ?self.stop_reason, "CompletionResponse::into_text: called");
        match self.content {
            Some(text) if !text.trim().is_empty() => Ok(text),
            _ => Err(LlmError::EmptyCompletion),
        }
    }
}

/// Why the model stopped generating
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StopReason {
    /// Natural end of turn
    EndTurn,
    /// Hit the max_tokens limit
    MaxTokens,
    /// Stop sequence encountered
    StopSequence,
}

impl StopReason {
    /// Parse an OpenAI-style `finish_reason`
    pub fn from_finish_reason(reason: Option<&str>) -> Self {
        match reason {
            Some("length") => StopReason::MaxTokens,
            _ => StopReason::EndTurn,
        }
    }

    /// Parse an Anthropic `stop_reason`
    pub fn from_anthropic(reason: &str) -> Self {
        match reason {
            "max_tokens" => StopReason::MaxTokens,
            "stop_sequence" => StopReason::StopSequence,
            _ => StopReason::EndTurn,
        }
    }
}

/// Token usage for cost tracking
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenUsage {
    pub input_tokens: u64,
    pub output_tokens: u64,
}

impl TokenUsage {
    pub fn total(&self) -> u64 {
        self.input_tokens + self.output_tokens
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_defaults_to_zero_temperature() {
        let req = CompletionRequest::new("sys", "user", 512);
        assert_eq!(req.temperature, 0.0);
        assert!(!req.json_output);
        assert_eq!(req.user_prompt, "user");

        let req = req.with_json_output(true).with_temperature(0.7);
        assert!(req.json_output);
        assert_eq!(req.temperature, 0.7);
    }

    #[test]
    fn test_into_text_rejects_blank() {
        assert!(matches!(
            CompletionResponse::text("  \n").into_text(),
            Err(LlmError::EmptyCompletion)
        ));
        let none = CompletionResponse {
            content: None,
            stop_reason: StopReason::EndTurn,
            usage: TokenUsage::default(),
        };
        assert!(matches!(none.into_text(), Err(LlmError::EmptyCompletion)));
        assert_eq!(CompletionResponse::text("{}").into_text().unwrap(), "{}");
    }

    #[test]
    fn test_stop_reason_parsing() {
        assert_eq!(StopReason::from_finish_reason(Some("length")), StopReason::MaxTokens);
        assert_eq!(StopReason::from_finish_reason(Some("stop")), StopReason::EndTurn);
        assert_eq!(StopReason::from_finish_reason(None), StopReason::EndTurn);
        assert_eq!(StopReason::from_anthropic("max_tokens"), StopReason::MaxTokens);
        assert_eq!(StopReason::from_anthropic("end_turn"), StopReason::EndTurn);
    }

    #[test]
    fn test_token_usage_total() {
        let usage = TokenUsage {
            input_tokens: 100,
            output_tokens: 50,
        };
        assert_eq!(usage.total(), 150);
    }
}
