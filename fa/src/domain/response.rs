//! AgentResponse - the orchestrator's entire output contract

use serde::{Deserialize, Serialize};

use super::StructuredRecipe;

/// Why the agent declined to answer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RefusalReason {
    /// The tools produced no evidence; answering would mean inventing facts
    DataNotAvailable,
    /// The query was empty or whitespace
    EmptyQuery,
}

/// Classification of a failed answer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FailureKind {
    /// Model output was not valid JSON
    SchemaViolation,
    /// No inference backend is configured
    NoInferenceEngine,
    /// Every configured backend raised an error
    InferenceFailed,
    /// The remote backend is the only option and has no credential
    AuthRequired,
}

/// Exactly one outcome per query
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum AgentResponse {
    /// The model produced a recipe that passed validation
    Success { recipe: StructuredRecipe },

    /// The model produced JSON that is not a valid recipe; kept as-is
    Salvaged {
        output: serde_json::Value,
        error_detail: String,
    },

    Refusal { reason: RefusalReason, message: String },

    ValidationFailure {
        error: FailureKind,
        /// What the model actually produced, when it produced anything
        #[serde(default, skip_serializing_if = "Option::is_none")]
        raw_output: Option<String>,
        error_detail: String,
    },
}

impl AgentResponse {
    pub fn refusal(reason: RefusalReason, message: impl Into<String>) -> Self {
        Self::Refusal {
            reason,
            message: message.into(),
        }
    }

    pub fn failure(error: FailureKind, error_detail: impl Into<String>) -> Self {
        Self::ValidationFailure {
            error,
            raw_output: None,
            error_detail: error_detail.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success { .. })
    }

    /// The recipe, if this is a success
    pub fn recipe(&self) -> Option<&StructuredRecipe> {
        match self {
            Self::Success { recipe } => Some(recipe),
            _ => None,
        }
    }
}
