//! FarmAgent - evidence-grounded agronomy agent
//!
//! Answers crop questions with a `StructuredRecipe` built only from verified
//! evidence: documents retrieved from a local index, or pages fetched from an
//! allow-listed set of agronomy domains. When no evidence is found the agent
//! refuses instead of letting the model answer from its own knowledge.
//!
//! # Architecture
//!
//! ```text
//! query ─► Planner ─► Tools (retriever, search+fetch) ─► context ─► gate
//!                                                                  │
//!            AgentResponse ◄─ validate ◄─ primary/fallback LLM ◄─ prompts + exemplar
//! ```

pub mod agent;
pub mod cli;
pub mod config;
pub mod domain;
pub mod golden;
pub mod llm;
pub mod prompts;
pub mod tools;

pub use agent::{AgentRuntime, AgentSettings};
pub use config::Config;
pub use domain::{AgentResponse, EvidenceDocument, FailureKind, RefusalReason, StructuredRecipe};
