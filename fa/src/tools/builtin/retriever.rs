//! retriever tool - semantic lookup against the persistent document index

use std::sync::Arc;

use async_trait::async_trait;
use docstore::{DocId, DocumentIndex, NewDocument};
use tracing::{debug, warn};

use super::RETRIEVER_TOOL;
use crate::domain::EvidenceDocument;
use crate::tools::{Tool, ToolError, ToolResult};

/// Retrieval over a `DocumentIndex`
pub struct RetrieverTool {
    index: Arc<dyn DocumentIndex>,
    default_top_k: usize,
}

impl RetrieverTool {
    pub fn new(index: Arc<dyn DocumentIndex>, default_top_k: usize) -> Self {
        debug!(default_top_k, "RetrieverTool::new: called");
        Self { index, default_top_k }
    }

    pub fn default_top_k(&self) -> usize {
        self.default_top_k
    }

    /// Up to `top_k` documents, most relevant first, each carrying its distance
    pub async fn search(&self, query: &str, top_k: usize) -> ToolResult {
        debug!(%query, top_k, "search: called");
        match self.search_inner(query, top_k).await {
            Ok(documents) => {
                debug!(count = documents.len(), "search: done");
                let message = format!("{} document(s) retrieved", documents.len());
                ToolResult::success(documents).with_message(message)
            }
            Err(e) => {
                warn!(error = %e, "search: failed");
                e.into()
            }
        }
    }

    async fn search_inner(&self, query: &str, top_k: usize) -> Result<Vec<EvidenceDocument>, ToolError> {
        if top_k == 0 {
            return Err(ToolError::InvalidArgument("top_k must be at least 1".to_string()));
        }
        if query.trim().is_empty() {
            return Err(ToolError::InvalidArgument("query is empty".to_string()));
        }

        // Embedding and scanning are CPU work; keep them off the async workers
        let index = Arc::clone(&self.index);
        let query = query.to_string();
        let hits = tokio::task::spawn_blocking(move || index.query(&query, top_k))
            .await
            .map_err(|e| ToolError::Index(e.to_string()))?
            .map_err(|e| ToolError::Index(format!("{:#}", e)))?;

        Ok(hits.into_iter().map(EvidenceDocument::from).collect())
    }

    /// Add documents to the index; each call mints fresh identifiers
    pub fn add_documents(&self, docs: &[NewDocument]) -> eyre::Result<Vec<DocId>> {
        debug!(count = docs.len(), "add_documents: called");
        self.index.add_documents(docs)
    }
}

#[async_trait]
impl Tool for RetrieverTool {
    fn name(&self) -> &'static str {
        RETRIEVER_TOOL
    }

    fn description(&self) -> &'static str {
        "Searches the verified agronomy document index. Input: a natural-language query."
    }

    async fn run(&self, input: &str) -> ToolResult {
        self.search(input, self.default_top_k).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::ToolStatus;
    use docstore::DocStore;
    use tempfile::TempDir;

    fn tool_with_docs(docs: &[(&str, &str)]) -> (TempDir, RetrieverTool) {
        let temp = TempDir::new().unwrap();
        let store = DocStore::open(temp.path()).unwrap();
        let tool = RetrieverTool::new(Arc::new(store), 3);
        let docs: Vec<NewDocument> = docs
            .iter()
            .map(|(text, source)| NewDocument::new(*text).with_meta("source", *source))
            .collect();
        tool.add_documents(&docs).unwrap();
        (temp, tool)
    }

    #[tokio::test]
    async fn test_search_returns_ranked_documents_with_distance() {
        let (_temp, tool) = tool_with_docs(&[
            ("Tomato seedlings require 14-16 hours of light per day.", "fao.org/tomato"),
            ("Rice paddies need standing water during tillering.", "icar.org.in/rice"),
        ]);

        let result = tool.search("light for tomato seedlings", 1).await;

        assert_eq!(result.status, ToolStatus::Success);
        assert_eq!(result.documents.len(), 1);
        assert_eq!(result.documents[0].source(), "fao.org/tomato");
        assert!(result.documents[0].distance.is_some());
    }

    #[tokio::test]
    async fn test_run_uses_default_top_k() {
        let (_temp, tool) = tool_with_docs(&[
            ("maize nitrogen", "a"),
            ("maize potassium", "b"),
            ("maize phosphorus", "c"),
            ("maize sulfur", "d"),
        ]);

        let result = tool.run("maize").await;
        assert_eq!(result.documents.len(), 3);
    }

    #[tokio::test]
    async fn test_empty_index_is_success_without_documents() {
        let (_temp, tool) = tool_with_docs(&[]);
        let result = tool.run("anything").await;
        assert!(result.is_success());
        assert!(result.documents.is_empty());
    }

    #[tokio::test]
    async fn test_zero_top_k_is_error() {
        let (_temp, tool) = tool_with_docs(&[("text", "src")]);
        let result = tool.search("text", 0).await;
        assert_eq!(result.status, ToolStatus::Error);
    }

    #[test]
    fn test_add_documents_creates_duplicates() {
        let (_temp, tool) = tool_with_docs(&[]);
        let doc = NewDocument::new("same text").with_meta("source", "s");
        let first = tool.add_documents(std::slice::from_ref(&doc)).unwrap();
        let second = tool.add_documents(std::slice::from_ref(&doc)).unwrap();
        assert_ne!(first, second);
        assert!(tool.add_documents(&[]).unwrap().is_empty());
    }
}
