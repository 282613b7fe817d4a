//! search tool - domain-restricted web search with full-text fetch

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use futures::future::join_all;
use reqwest::Client;
use serde_json::Value;
use tracing::{debug, info, warn};

use super::{FetchMode, FetchTool, SEARCH_TOOL};
use crate::config::SearchToolConfig;
use crate::domain::EvidenceDocument;
use crate::tools::{Tool, ToolError, ToolResult};

/// Source label of the aggregated search document
pub const WEB_SEARCH_SOURCE: &str = "web_search";

/// One search engine hit
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchHit {
    pub title: String,
    pub url: String,
    pub snippet: String,
}

/// A web search backend
#[async_trait]
pub trait SearchEngine: Send + Sync {
    fn name(&self) -> &str;

    async fn search(&self, query: &str, max_results: usize) -> Result<Vec<SearchHit>, ToolError>;
}

/// Supported search APIs
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchProvider {
    Tavily,
    Brave,
    SerpApi,
}

impl SearchProvider {
    fn default_base_url(&self) -> &'static str {
        match self {
            SearchProvider::Tavily => "https://api.tavily.com",
            SearchProvider::Brave => "https://api.search.brave.com",
            SearchProvider::SerpApi => "https://serpapi.com",
        }
    }

    fn as_str(&self) -> &'static str {
        match self {
            SearchProvider::Tavily => "tavily",
            SearchProvider::Brave => "brave",
            SearchProvider::SerpApi => "serpapi",
        }
    }
}

/// Search over Tavily, Brave or SerpAPI
pub struct WebSearchEngine {
    provider: SearchProvider,
    api_key: String,
    base_url: String,
    http: Client,
}

impl WebSearchEngine {
    pub fn new(provider: SearchProvider, api_key: impl Into<String>, timeout: Duration) -> Result<Self, ToolError> {
        let http = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            provider,
            api_key: api_key.into(),
            base_url: provider.default_base_url().to_string(),
            http,
        })
    }

    /// Load from environment variables
    ///
    /// Tavily first, then Brave, then SerpAPI; `None` when no key is set.
    pub fn from_env(timeout: Duration) -> Result<Option<Self>, ToolError> {
        let candidates = [
            ("TAVILY_API_KEY", SearchProvider::Tavily),
            ("BRAVE_API_KEY", SearchProvider::Brave),
            ("SERPAPI_KEY", SearchProvider::SerpApi),
        ];
        for (var, provider) in candidates {
            if let Ok(key) = std::env::var(var)
                && !key.trim().is_empty()
            {
                debug!(provider = provider.as_str(), "WebSearchEngine::from_env: using provider");
                return Self::new(provider, key, timeout).map(Some);
            }
        }
        debug!("WebSearchEngine::from_env: no search API key set");
        Ok(None)
    }

    /// Point at a different API host (self-hosted proxies, tests)
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    fn engine_error(&self, message: impl Into<String>) -> ToolError {
        ToolError::Search {
            engine: self.provider.as_str().to_string(),
            message: message.into(),
        }
    }

    async fn send(&self, request: reqwest::RequestBuilder) -> Result<Value, ToolError> {
        let response = request.send().await.map_err(|e| self.engine_error(e.to_string()))?;
        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().await.unwrap_or_default();
            return Err(self.engine_error(format!("HTTP {}: {}", status, text)));
        }
        response.json().await.map_err(|e| self.engine_error(e.to_string()))
    }

    async fn search_tavily(&self, query: &str, max_results: usize) -> Result<Vec<SearchHit>, ToolError> {
        let body = serde_json::json!({
            "api_key": self.api_key,
            "query": query,
            "max_results": max_results,
            "search_depth": "basic"
        });
        let result = self
            .send(self.http.post(format!("{}/search", self.base_url)).json(&body))
            .await?;
        Ok(parse_hits(&result["results"], "url", "content"))
    }

    async fn search_brave(&self, query: &str, max_results: usize) -> Result<Vec<SearchHit>, ToolError> {
        let request = self
            .http
            .get(format!("{}/res/v1/web/search", self.base_url))
            .header("X-Subscription-Token", &self.api_key)
            .query(&[("q", query), ("count", &max_results.to_string())]);
        let result = self.send(request).await?;
        Ok(parse_hits(&result["web"]["results"], "url", "description"))
    }

    async fn search_serpapi(&self, query: &str, max_results: usize) -> Result<Vec<SearchHit>, ToolError> {
        let request = self.http.get(format!("{}/search", self.base_url)).query(&[
            ("q", query),
            ("api_key", &self.api_key),
            ("num", &max_results.to_string()),
            ("engine", "google"),
        ]);
        let result = self.send(request).await?;
        Ok(parse_hits(&result["organic_results"], "link", "snippet"))
    }
}

#[async_trait]
impl SearchEngine for WebSearchEngine {
    fn name(&self) -> &str {
        self.provider.as_str()
    }

    async fn search(&self, query: &str, max_results: usize) -> Result<Vec<SearchHit>, ToolError> {
        debug!(provider = self.provider.as_str(), %query, max_results, "WebSearchEngine::search: called");
        let mut hits = match self.provider {
            SearchProvider::Tavily => self.search_tavily(query, max_results).await?,
            SearchProvider::Brave => self.search_brave(query, max_results).await?,
            SearchProvider::SerpApi => self.search_serpapi(query, max_results).await?,
        };
        hits.truncate(max_results);
        Ok(hits)
    }
}

/// Hits from a JSON array, skipping entries without a URL
fn parse_hits(results: &Value, url_key: &str, snippet_key: &str) -> Vec<SearchHit> {
    results
        .as_array()
        .map(|items| {
            items
                .iter()
                .filter_map(|r| {
                    let url = r[url_key].as_str()?.to_string();
                    Some(SearchHit {
                        title: r["title"].as_str().unwrap_or("(no title)").to_string(),
                        url,
                        snippet: r[snippet_key].as_str().unwrap_or("").to_string(),
                    })
                })
                .collect()
        })
        .unwrap_or_default()
}

/// Web search restricted to the fetch tool's allow-list
pub struct ConstrainedSearchTool {
    engine: Arc<dyn SearchEngine>,
    fetcher: Arc<FetchTool>,
    max_results: usize,
    max_chars_per_hit: usize,
}

impl ConstrainedSearchTool {
    pub fn new(engine: Arc<dyn SearchEngine>, fetcher: Arc<FetchTool>, config: &SearchToolConfig) -> Self {
        debug!(engine = engine.name(), max_results = config.max_results, "ConstrainedSearchTool::new: called");
        Self {
            engine,
            fetcher,
            max_results: config.max_results,
            max_chars_per_hit: config.max_chars_per_hit,
        }
    }

    /// The query with a `site:` disjunction built from the allow-list appended
    ///
    /// Hits are fetched without a domain check, so a fetcher that cannot
    /// restrict the search (allow-any) is refused.
    pub fn restricted_query(&self, query: &str) -> Result<String, ToolError> {
        let ops = self
            .fetcher
            .allowlist()
            .site_operators()
            .ok_or(ToolError::UnrestrictedSearch)?;
        Ok(format!("{} {}", query.trim(), ops))
    }

    /// Search, fetch each hit's full text and aggregate into one document
    pub async fn search(&self, query: &str) -> ToolResult {
        let restricted = match self.restricted_query(query) {
            Ok(restricted) => restricted,
            Err(e) => {
                warn!(error = %e, "search: refusing unrestricted query");
                return e.into();
            }
        };
        info!(engine = self.engine.name(), query = %restricted, "Searching web");

        let hits = match self.engine.search(&restricted, self.max_results).await {
            Ok(hits) => hits,
            Err(e) => {
                warn!(error = %e, "search: engine failed");
                return e.into();
            }
        };

        if hits.is_empty() {
            debug!("search: no results");
            return ToolResult::warning("No results found.", Vec::new());
        }

        let hits: Vec<SearchHit> = hits.into_iter().take(self.max_results).collect();
        let fetches = hits.iter().map(|hit| self.fetcher.fetch(&hit.url, FetchMode::AllowAny));
        let pages = join_all(fetches).await;

        let mut combined = String::new();
        let mut sources = Vec::with_capacity(hits.len());
        for (hit, page) in hits.iter().zip(pages) {
            if page.is_success()
                && let Some(doc) = page.documents.first()
            {
                let text: String = doc.text.chars().take(self.max_chars_per_hit).collect();
                combined.push_str(&format!("Source: {}\nTitle: {}\nContent: {}\n\n", hit.url, hit.title, text));
            } else {
                debug!(url = %hit.url, "search: fetch failed, using snippet");
                combined.push_str(&format!(
                    "Source: {}\nTitle: {}\nSnippet: {}\n\n",
                    hit.url, hit.title, hit.snippet
                ));
            }
            sources.push(hit.url.clone());
        }

        let doc = EvidenceDocument::new(combined, WEB_SEARCH_SOURCE).with_meta("query", query.trim());
        ToolResult::success(vec![doc]).with_sources(sources)
    }
}

#[async_trait]
impl Tool for ConstrainedSearchTool {
    fn name(&self) -> &'static str {
        SEARCH_TOOL
    }

    fn description(&self) -> &'static str {
        "Searches the web, restricted to trusted agronomy domains. Input: a query."
    }

    async fn run(&self, input: &str) -> ToolResult {
        self.search(input).await
    }
}
