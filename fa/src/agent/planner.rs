//! Tool planning

use tracing::debug;

use crate::tools::ToolRegistry;
use crate::tools::builtin::{RETRIEVER_TOOL, SEARCH_TOOL};

/// Chooses which tools to invoke for a query, in order
///
/// Implementations must be deterministic for a given query and registry.
pub trait Planner: Send + Sync {
    fn plan(&self, query: &str, registry: &ToolRegistry) -> Vec<String>;
}

/// Web search first when available, then the document index
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultPlanner;

impl Planner for DefaultPlanner {
    fn plan(&self, query: &str, registry: &ToolRegistry) -> Vec<String> {
        let mut plan = Vec::new();
        if registry.has_tool(SEARCH_TOOL) {
            plan.push(SEARCH_TOOL.to_string());
        }
        if registry.has_tool(RETRIEVER_TOOL) {
            plan.push(RETRIEVER_TOOL.to_string());
        }
        debug!(%query, ?plan, "DefaultPlanner::plan: done");
        plan
    }
}
