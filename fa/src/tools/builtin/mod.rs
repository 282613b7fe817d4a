//! Built-in tools

mod fetch;
mod retriever;
mod search;

pub use fetch::{FetchMode, FetchTool, extract_text};
pub use retriever::RetrieverTool;
pub use search::{ConstrainedSearchTool, SearchEngine, SearchHit, SearchProvider, WebSearchEngine};

/// Semantic lookup against the document index
pub const RETRIEVER_TOOL: &str = "retriever_tool";

/// Trust-gated single-URL fetch
pub const FETCH_TOOL: &str = "scraper_tool";

/// Domain-restricted web search
pub const SEARCH_TOOL: &str = "search_tool";
