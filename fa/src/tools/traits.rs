//! Tool trait definition

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::ToolError;
use crate::domain::EvidenceDocument;

/// An information source the orchestrator can plan and invoke
#[async_trait]
pub trait Tool: Send + Sync {
    /// Stable identifier used for planning and lookup
    fn name(&self) -> &'static str;

    /// Human-readable description
    fn description(&self) -> &'static str;

    /// Run the tool on free-text input (a query or a URL)
    ///
    /// Never fails: every failure is folded into the returned `ToolResult`.
    async fn run(&self, input: &str) -> ToolResult;
}

/// Outcome classification of a tool run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ToolStatus {
    Success,
    /// Usable-looking but suspect output, e.g. a page too short to be real content
    Warning,
    Error,
}

/// Result of a tool run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolResult {
    pub status: ToolStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(default)]
    pub documents: Vec<EvidenceDocument>,
    /// Per-hit citation URLs, for tools that aggregate several sources
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub sources: Vec<String>,
}

impl ToolResult {
    /// Create a successful result
    pub fn success(documents: Vec<EvidenceDocument>) -> Self {
        debug!(document_count = documents.len(), "ToolResult::success: called");
        Self {
            status: ToolStatus::Success,
            message: None,
            documents,
            sources: Vec::new(),
        }
    }

    /// Create a warning result, keeping whatever documents were produced
    pub fn warning(message: impl Into<String>, documents: Vec<EvidenceDocument>) -> Self {
        debug!("ToolResult::warning: called");
        Self {
            status: ToolStatus::Warning,
            message: Some(message.into()),
            documents,
            sources: Vec::new(),
        }
    }

    /// Create an error result
    pub fn error(message: impl Into<String>) -> Self {
        debug!("ToolResult::error: called");
        Self {
            status: ToolStatus::Error,
            message: Some(message.into()),
            documents: Vec::new(),
            sources: Vec::new(),
        }
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    pub fn with_sources(mut self, sources: Vec<String>) -> Self {
        self.sources = sources;
        self
    }

    pub fn is_success(&self) -> bool {
        self.status == ToolStatus::Success
    }

    /// Documents that may be used as grounding evidence
    ///
    /// Only successful runs count; warnings and errors contribute nothing.
    pub fn into_evidence(self) -> Vec<EvidenceDocument> {
        match self.status {
            ToolStatus::Success => self.documents,
            ToolStatus::Warning | ToolStatus::Error => Vec::new(),
        }
    }
}

impl From<ToolError> for ToolResult {
    fn from(err: ToolError) -> Self {
        ToolResult::error(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tool_result_success() {
        let result = ToolResult::success(vec![EvidenceDocument::new("fact", "fao.org")]);
        assert!(result.is_success());
        assert!(result.message.is_none());
        assert_eq!(result.into_evidence().len(), 1);
    }

    #[test]
    fn test_warning_contributes_no_evidence() {
        let result = ToolResult::warning("too short", vec![EvidenceDocument::new("tiny", "fao.org")]);
        assert_eq!(result.status, ToolStatus::Warning);
        assert_eq!(result.documents.len(), 1);
        assert!(result.into_evidence().is_empty());
    }

    #[test]
    fn test_error_from_tool_error() {
        let result: ToolResult = ToolError::UnknownTool {
            name: "weather_tool".to_string(),
        }
        .into();
        assert_eq!(result.status, ToolStatus::Error);
        assert!(result.message.unwrap().contains("weather_tool"));
        assert!(result.documents.is_empty());
    }

    #[test]
    fn test_status_serializes_lowercase() {
        let json = serde_json::to_value(ToolResult::error("boom")).unwrap();
        assert_eq!(json["status"], "error");
        assert_eq!(json["message"], "boom");
        assert!(json.get("sources").is_none());
    }
}
