//! scraper tool - trust-gated fetch of a single URL

use std::sync::LazyLock;
use std::time::Duration;

use async_trait::async_trait;
use regex::Regex;
use reqwest::Client;
use scraper::{Html, Node};
use tracing::{debug, info, warn};

use super::FETCH_TOOL;
use crate::config::FetchConfig;
use crate::domain::EvidenceDocument;
use crate::tools::{DomainAllowList, Tool, ToolError, ToolResult};

/// Elements whose text is never page content
const SKIPPED_ELEMENTS: &[&str] = &["script", "style", "noscript", "nav", "header", "footer", "template"];

pub(crate) const SHORT_CONTENT_WARNING: &str = "Content too short, page might be JavaScript rendered.";

static WHITESPACE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s+").expect("valid whitespace regex"));

/// Whether the allow-list applies to a fetch
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchMode {
    /// Only allow-listed domains
    Trusted,
    /// Any http(s) URL; the caller has restricted sources upstream
    AllowAny,
}

/// Fetch visible text from an allow-listed URL
pub struct FetchTool {
    allowlist: DomainAllowList,
    http: Client,
    min_content_chars: usize,
    max_body_bytes: usize,
}

impl FetchTool {
    pub fn new(allowlist: DomainAllowList, config: &FetchConfig) -> Result<Self, ToolError> {
        debug!(allowlist = %allowlist, timeout_ms = config.timeout_ms, "FetchTool::new: called");
        let http = Client::builder()
            .timeout(Duration::from_millis(config.timeout_ms))
            .user_agent(config.user_agent.clone())
            .build()?;

        Ok(Self {
            allowlist,
            http,
            min_content_chars: config.min_content_chars,
            max_body_bytes: config.max_body_bytes,
        })
    }

    pub fn allowlist(&self) -> &DomainAllowList {
        &self.allowlist
    }

    /// Fetch `url` and return its visible text as one evidence document
    ///
    /// Text shorter than the configured minimum comes back as a warning carrying
    /// that text; refusals and transport failures come back as errors.
    pub async fn fetch(&self, url: &str, mode: FetchMode) -> ToolResult {
        debug!(%url, ?mode, "fetch: called");
        let text = match self.fetch_text(url, mode).await {
            Ok(text) => text,
            Err(e) => {
                warn!(%url, error = %e, "fetch: failed");
                return e.into();
            }
        };

        let doc = EvidenceDocument::new(text.clone(), url.trim());
        let chars = text.chars().count();
        if chars < self.min_content_chars {
            info!(%url, chars, "fetch: content below minimum length");
            return ToolResult::warning(SHORT_CONTENT_WARNING, vec![doc]);
        }

        debug!(%url, chars, "fetch: success");
        ToolResult::success(vec![doc])
    }

    async fn fetch_text(&self, url: &str, mode: FetchMode) -> Result<String, ToolError> {
        let parsed = match mode {
            FetchMode::Trusted => self.allowlist.check_url(url)?,
            FetchMode::AllowAny => DomainAllowList::allow_any().check_url(url)?,
        };

        let response = self.http.get(parsed.as_str()).send().await?;

        if !response.status().is_success() {
            return Err(ToolError::Http {
                status: response.status().as_u16(),
                url: parsed.to_string(),
            });
        }

        if let Some(len) = response.content_length()
            && len as usize > self.max_body_bytes
        {
            return Err(ToolError::ResponseTooLarge {
                limit: self.max_body_bytes,
            });
        }

        let is_html = response
            .headers()
            .get("content-type")
            .and_then(|v| v.to_str().ok())
            .map(|ct| ct.contains("text/html") || ct.contains("application/xhtml"))
            .unwrap_or(true);

        let body = response.bytes().await?;
        if body.len() > self.max_body_bytes {
            return Err(ToolError::ResponseTooLarge {
                limit: self.max_body_bytes,
            });
        }
        let body = String::from_utf8_lossy(&body);

        Ok(if is_html {
            extract_text(&body)
        } else {
            collapse_whitespace(&body)
        })
    }
}

#[async_trait]
impl Tool for FetchTool {
    fn name(&self) -> &'static str {
        FETCH_TOOL
    }

    fn description(&self) -> &'static str {
        "Fetches visible text from a URL on a trusted agronomy domain. Input: a URL."
    }

    async fn run(&self, input: &str) -> ToolResult {
        self.fetch(input.trim(), FetchMode::Trusted).await
    }
}

/// Visible text of an HTML document, whitespace collapsed
///
/// Text inside script, style, navigation, header and footer elements is dropped.
pub fn extract_text(html: &str) -> String {
    let document = Html::parse_document(html);
    let mut parts: Vec<&str> = Vec::new();

    for node in document.tree.root().descendants() {
        let Node::Text(text) = node.value() else {
            continue;
        };
        let skipped = node.ancestors().any(|a| {
            a.value()
                .as_element()
                .is_some_and(|e| SKIPPED_ELEMENTS.contains(&e.name()))
        });
        if skipped {
            continue;
        }
        let trimmed = text.trim();
        if !trimmed.is_empty() {
            parts.push(trimmed);
        }
    }

    collapse_whitespace(&parts.join(" "))
}

fn collapse_whitespace(text: &str) -> String {
    WHITESPACE.replace_all(text, " ").trim().to_string()
}
