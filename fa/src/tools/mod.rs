//! Tool system for the agent
//!
//! Every information source implements `Tool`: a stable name and a `run`
//! that folds all failures into a `ToolResult`. The orchestrator never sees
//! tool-internal errors.

mod allowlist;
mod error;
mod registry;
mod traits;

pub mod builtin;

pub use allowlist::DomainAllowList;
pub use error::ToolError;
pub use registry::ToolRegistry;
pub use traits::{Tool, ToolResult, ToolStatus};
