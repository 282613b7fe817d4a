//! StructuredRecipe - the output contract of the agent

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

/// A grounded, actionable crop recipe
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StructuredRecipe {
    pub name: String,
    pub ingredients: Vec<Ingredient>,
    pub instructions: Vec<Instruction>,
    pub timetable: Vec<TimetableEntry>,
    /// Citations backing the facts in this recipe
    #[serde(default)]
    pub source_citations: Vec<String>,
}

/// An input applied at a growth stage
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Ingredient {
    pub name: String,
    pub quantity: Quantity,
    pub growth_stage: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Quantity {
    #[serde(default)]
    pub value: Option<f64>,
    pub unit: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Instruction {
    pub step: u32,
    pub description: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimetableEntry {
    /// Period label, e.g. "Week 4"
    pub period: String,
    pub tasks: Vec<Task>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
    pub name: String,
    /// Name of an ingredient from the ingredients list
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ingredient: Option<String>,
}

/// Structural violations that make a parsed recipe unusable
#[derive(Debug, Error, PartialEq, Eq)]
pub enum RecipeError {
    #[error("Instruction step {step} is repeated")]
    DuplicateStep { step: u32 },

    #[error("Instruction step {step} follows step {previous}; steps must increase")]
    StepOutOfOrder { previous: u32, step: u32 },
}

impl StructuredRecipe {
    /// Check the structural invariants: instruction steps unique and increasing
    pub fn validate(&self) -> Result<(), RecipeError> {
        debug!(name = %self.name, steps = self.instructions.len(), "StructuredRecipe::validate: called");
        let mut previous: Option<u32> = None;
        for instruction in &self.instructions {
            if let Some(prev) = previous {
                if instruction.step == prev {
                    return Err(RecipeError::DuplicateStep { step: instruction.step });
                }
                if instruction.step < prev {
                    return Err(RecipeError::StepOutOfOrder {
                        previous: prev,
                        step: instruction.step,
                    });
                }
            }
            previous = Some(instruction.step);
        }
        Ok(())
    }

    /// Ingredient names referenced by tasks but missing from the ingredients list
    ///
    /// These are reported, never rejected.
    pub fn dangling_references(&self) -> Vec<String> {
        self.timetable
            .iter()
            .flat_map(|entry| entry.tasks.iter())
            .filter_map(|task| task.ingredient.as_deref())
            .filter(|name| !self.ingredients.iter().any(|i| i.name.eq_ignore_ascii_case(name)))
            .map(str::to_string)
            .collect()
    }
}
