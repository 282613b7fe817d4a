//! ToolRegistry - the set of tools available to the planner

use std::collections::HashMap;
use std::sync::Arc;

use tracing::debug;

use super::{Tool, ToolError, ToolResult};

/// Tools by name
#[derive(Default, Clone)]
pub struct ToolRegistry {
    tools: HashMap<String, Arc<dyn Tool>>,
}

impl ToolRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a tool, replacing any tool with the same name
    pub fn register(&mut self, tool: Arc<dyn Tool>) {
        debug!(name = tool.name(), "ToolRegistry::register: called");
        self.tools.insert(tool.name().to_string(), tool);
    }

    pub fn get(&self, name: &str) -> Option<Arc<dyn Tool>> {
        self.tools.get(name).cloned()
    }

    /// Check if a tool exists
    pub fn has_tool(&self, name: &str) -> bool {
        self.tools.contains_key(name)
    }

    /// Tool names, sorted
    pub fn tool_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.tools.keys().cloned().collect();
        names.sort();
        names
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }

    /// Run a tool by name; an unknown name yields an error result
    pub async fn run(&self, name: &str, input: &str) -> ToolResult {
        match self.tools.get(name) {
            Some(tool) => tool.run(input).await,
            None => {
                debug!(%name, "ToolRegistry::run: unknown tool");
                ToolError::UnknownTool { name: name.to_string() }.into()
            }
        }
    }
}

impl std::fmt::Debug for ToolRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ToolRegistry").field("tools", &self.tool_names()).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::EvidenceDocument;
    use crate::tools::ToolStatus;
    use async_trait::async_trait;

    struct EchoTool;

    #[async_trait]
    impl Tool for EchoTool {
        fn name(&self) -> &'static str {
            "echo_tool"
        }

        fn description(&self) -> &'static str {
            "Echoes input"
        }

        async fn run(&self, input: &str) -> ToolResult {
            ToolResult::success(vec![EvidenceDocument::new(input, "echo")])
        }
    }

    #[tokio::test]
    async fn test_run_registered_tool() {
        let mut registry = ToolRegistry::new();
        registry.register(Arc::new(EchoTool));

        assert!(registry.has_tool("echo_tool"));
        let result = registry.run("echo_tool", "hello").await;
        assert_eq!(result.documents[0].text, "hello");
    }

    #[tokio::test]
    async fn test_run_unknown_tool_is_error_result() {
        let registry = ToolRegistry::new();
        let result = registry.run("missing_tool", "hello").await;
        assert_eq!(result.status, ToolStatus::Error);
        assert!(result.message.unwrap().contains("missing_tool"));
    }

    #[test]
    fn test_tool_names_sorted() {
        let mut registry = ToolRegistry::new();
        registry.register(Arc::new(EchoTool));
        registry.register(Arc::new(EchoTool));
        assert_eq!(registry.tool_names(), vec!["echo_tool".to_string()]);
        assert_eq!(registry.len(), 1);
    }
}
