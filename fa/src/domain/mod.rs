//! Domain types shared by tools, the orchestrator and callers

mod evidence;
mod recipe;
mod response;

pub use evidence::EvidenceDocument;
pub use recipe::{Ingredient, Instruction, Quantity, RecipeError, StructuredRecipe, Task, TimetableEntry};
pub use response::{AgentResponse, FailureKind, RefusalReason};
