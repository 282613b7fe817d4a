//! The agent orchestration and grounding-enforcement engine

mod context;
mod extract;
mod inference;
mod planner;
mod runtime;

pub use context::{format_context, is_grounded};
pub use extract::{strip_fences, validate_output};
pub use inference::{InferenceOutcome, InferenceState, infer};
pub use planner::{DefaultPlanner, Planner};
pub use runtime::{AgentRuntime, AgentSettings, NO_EVIDENCE_MESSAGE};
