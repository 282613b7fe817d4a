//! Output extraction, validation and salvage

use serde_json::Value;
use tracing::{debug, warn};

use crate::domain::{AgentResponse, FailureKind, StructuredRecipe};

/// Strip a single enclosing code fence, optionally tagged `json`
///
/// Whitespace around the fence is ignored. Text without an enclosing fence
/// is returned unchanged.
pub fn strip_fences(raw: &str) -> &str {
    let trimmed = raw.trim();
    let Some(inner) = trimmed.strip_prefix("```").and_then(|s| s.strip_suffix("```")) else {
        return raw;
    };
    let inner = inner
        .strip_prefix("json")
        .or_else(|| inner.strip_prefix("JSON"))
        .unwrap_or(inner);
    inner.trim()
}

/// Turn model output into exactly one response
///
/// A valid recipe is a success. Valid JSON that is not a valid recipe is
/// salvaged as-is. Anything else is a schema violation that keeps the model
/// text, minus any enclosing fence.
pub fn validate_output(raw: &str) -> AgentResponse {
    let text = strip_fences(raw);
    debug!(len = text.len(), "validate_output: called");

    let value: Value = match serde_json::from_str(text) {
        Ok(value) => value,
        Err(e) => {
            warn!(error = %e, "Model output is not valid JSON");
            return AgentResponse::ValidationFailure {
                error: FailureKind::SchemaViolation,
                raw_output: Some(text.to_string()),
                error_detail: format!("Model output is not valid JSON: {}", e),
            };
        }
    };

    let recipe: StructuredRecipe = match serde_json::from_value(value.clone()) {
        Ok(recipe) => recipe,
        Err(e) => {
            warn!(error = %e, "Model output does not match the recipe schema, salvaging");
            return AgentResponse::Salvaged {
                output: value,
                error_detail: format!("Output does not match the recipe schema: {}", e),
            };
        }
    };

    if let Err(e) = recipe.validate() {
        warn!(error = %e, "Recipe failed structural validation, salvaging");
        return AgentResponse::Salvaged {
            output: value,
            error_detail: e.to_string(),
        };
    }

    for name in recipe.dangling_references() {
        warn!(ingredient = %name, "Task references an ingredient missing from the ingredients list");
    }

    AgentResponse::Success { recipe }
}
